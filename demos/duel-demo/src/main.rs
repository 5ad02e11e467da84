//! Scripted two-client duel over the in-memory store.
//!
//! Both "clients" live in one process here, but they only talk through
//! the store — every line below is a call a real phone would make.
//!
//! Run with `RUST_LOG=info cargo run -p duel-demo` to watch the
//! lifecycle logs.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use codeclash::prelude::*;

fn sample_pool() -> Vec<Exercise> {
    let snippets = [
        ("let x = \"5\" + 3;", "53"),
        ("print(2 ** 3)", "8"),
        ("console.log([] == false)", "true"),
        ("len(\"héllo\")", "5"),
        ("1 / 0", "panic"),
        ("print(0.1 + 0.2 == 0.3)", "False"),
        ("\"abc\".repeat(2)", "abcabc"),
        ("[1, 2, 3].pop()", "3"),
    ];
    snippets
        .iter()
        .enumerate()
        .map(|(i, (prompt, answer))| Exercise {
            id: format!("snippet-{i}"),
            prompt: (*prompt).to_string(),
            choices: vec![(*answer).to_string(), "error".to_string(), "undefined".to_string()],
            answer: 0,
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), CodeclashError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = Arc::new(MemoryStore::new());
    let app = CodeclashApp::<MemoryStore>::builder()
        .pool(sample_pool())
        .build(Arc::clone(&store))?;
    let _reaper = app.spawn_reaper(Duration::from_secs(60));

    let ada = PlayerId::new("uid-ada");
    let grace = PlayerId::new("uid-grace");

    println!("— today's challenge —");
    for exercise in app.todays_exercises() {
        println!("  {}", exercise.prompt);
    }

    // Ada hosts and would read the code to Grace over voice chat.
    let code = app.create_duel(ada.clone(), "ada").await?;
    println!("\nada hosts duel {code}");

    // Ada's screen follows the record.
    let subscription = app
        .subscribe(&code, |record| {
            println!(
                "  [watch] status={} host_score={} guest_score={}",
                record.status,
                record.host.correct_answers,
                record
                    .guest
                    .as_ref()
                    .map(|g| g.correct_answers)
                    .unwrap_or(0),
            );
        })
        .await?;

    let snapshot = app.join_duel(&code, grace.clone(), "grace").await?;
    println!("grace joined; first exercise: {}", snapshot.exercises[0].prompt);

    app.set_ready(&code, &ada).await?;
    app.set_ready(&code, &grace).await?;

    // Trade answers.
    app.update_score(
        &code,
        &ada,
        ScoreUpdate {
            correct_answers: Some(4),
            errors: Some(1),
            current_question: Some(5),
            finished_at: Some(Utc::now()),
        },
    )
    .await?;
    app.update_score(
        &code,
        &grace,
        ScoreUpdate {
            correct_answers: Some(5),
            errors: Some(0),
            current_question: Some(5),
            finished_at: Some(Utc::now()),
        },
    )
    .await?;

    // Let the watcher drain, then read the verdict.
    tokio::time::sleep(Duration::from_millis(50)).await;
    subscription.unsubscribe();

    let seen: Arc<std::sync::Mutex<Option<DuelRecord>>> =
        Arc::new(std::sync::Mutex::new(None));
    let sink = Arc::clone(&seen);
    let last_look = app
        .subscribe(&code, move |record| {
            *sink.lock().expect("watcher mutex") = Some(record);
        })
        .await?;
    tokio::time::sleep(Duration::from_millis(10)).await;
    last_look.unsubscribe();

    let record = seen
        .lock()
        .expect("watcher mutex")
        .take()
        .expect("subscription fires with current state");
    match record.winner() {
        Some(winner) => println!("\n{} wins {}!", winner.username, code),
        None => println!("\n{code} ends in a draw"),
    }

    Ok(())
}
