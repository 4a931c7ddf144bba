//! Live websocket smoke test: attach an observer over a real socket and
//! watch one full exercise session stream by.

use futures_util::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

use arena::actors::{EventBusMsg, ExerciseMsg};
use arena::api;
use arena::app_state::AppState;
use arena::config::Config;
use arena::driver::ScriptedDriver;

async fn wait_for_observers(state: &AppState, expected: usize) {
    let event_bus = state.event_bus();
    for _ in 0..50 {
        let count =
            ractor::call!(event_bus, |reply| EventBusMsg::ObserverCount { reply }).unwrap();
        if count >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("observer never attached");
}

#[tokio::test]
async fn test_observer_receives_session_stream() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = Config {
        bind_addr: "127.0.0.1:0".to_string(),
        log_file: temp_dir.path().join("server.log"),
        input_timeout: None,
    };
    let app_state = AppState::spawn(config, Arc::new(ScriptedDriver::demo()))
        .await
        .unwrap();

    let app = api::router().with_state(api::ApiState {
        app_state: app_state.clone(),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let (mut socket, _response) =
        tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
            .await
            .expect("websocket connect failed");
    wait_for_observers(&app_state, 1).await;

    let exercise = app_state.exercise();
    let problem = "reverse a string".to_string();
    ractor::call!(exercise, |reply| ExerciseMsg::Admit { problem, reply })
        .unwrap()
        .unwrap();

    let mut saw_opening_sys = false;
    let mut saw_done = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);

    while tokio::time::Instant::now() < deadline && !saw_done {
        let frame = tokio::time::timeout(Duration::from_secs(2), socket.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed early")
            .expect("socket error");

        let Message::Text(text) = frame else { continue };
        let event: Value = serde_json::from_str(&text).unwrap();

        match event["type"].as_str().unwrap() {
            "sys" if !saw_opening_sys => {
                assert!(event["msg"].as_str().unwrap().contains("reverse a string"));
                saw_opening_sys = true;
            }
            "done" => {
                assert!(saw_opening_sys, "sys must precede done");
                assert_eq!(event["msg"], "Team has finished the task.");
                saw_done = true;
            }
            _ => {}
        }
    }

    assert!(saw_done, "observer never saw the done event");
}
