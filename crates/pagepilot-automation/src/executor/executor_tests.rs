use std::sync::Arc;

use super::*;
use crate::scripted::{PageOp, ScriptedElement, ScriptedPage};
use pagepilot_protocol::ErrorKind;

const INPUT: &str = "#prompt-textarea";
const SEND: &str = "[data-testid='send-button']";
const ASSISTANT: &str = "[data-message-author-role='assistant']";
const STOP: &str = "[data-testid='stop-button']";
const IMAGE: &str = "[data-testid='generated-image'] img";

fn executor() -> ActionExecutor {
    ActionExecutor::new(&Config::default())
}

/// Input plus a send button that only enables once text is typed.
fn composer() -> ScriptedPage {
    let page = ScriptedPage::new();
    page.insert(ScriptedElement::new("input").matching(INPUT));
    page.insert(ScriptedElement::new("send").matching(SEND).disabled());
    page.on_input("input", |m| m.enable("send"));
    page
}

#[tokio::test(start_paused = true)]
async fn test_prepare_ready() {
    let page = composer();
    let outcome = executor()
        .execute(&page, Action::PrepareInterface {})
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Ready {});
}

#[tokio::test(start_paused = true)]
async fn test_prepare_without_input_is_not_ready() {
    let page = ScriptedPage::new();
    let err = executor()
        .execute(&page, Action::PrepareInterface {})
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InterfaceNotReady);
}

#[tokio::test(start_paused = true)]
async fn test_submit_records_baseline_and_clicks() {
    let page = composer();
    page.insert(ScriptedElement::new("old-reply").matching(ASSISTANT).text("earlier"));

    let outcome = executor()
        .execute(
            &page,
            Action::SubmitPrompt {
                text: "hello".into(),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ActionOutcome::Submitted {
            baseline: ResponseBaseline {
                assistant_messages: 1,
                images: 0,
            }
        }
    );
    assert_eq!(page.content_of("input").as_deref(), Some("hello"));
    assert_eq!(
        page.ops(),
        vec![
            PageOp::SetContent {
                element: "input".into(),
                text: "hello".into()
            },
            PageOp::DispatchInput {
                element: "input".into()
            },
            PageOp::Click {
                element: "send".into()
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_submit_with_disabled_control() {
    let page = ScriptedPage::new();
    page.insert(ScriptedElement::new("input").matching(INPUT));
    page.insert(ScriptedElement::new("send").matching(SEND).disabled());

    let err = executor()
        .execute(&page, Action::SubmitPrompt { text: "hi".into() })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ControlUnavailable);
}

#[tokio::test(start_paused = true)]
async fn test_submit_without_input() {
    let page = ScriptedPage::new();
    let err = executor()
        .execute(&page, Action::SubmitPrompt { text: "hi".into() })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InterfaceNotReady);
}

#[tokio::test(start_paused = true)]
async fn test_await_response_waits_for_stable_text() {
    let page = ScriptedPage::new();
    page.insert(
        ScriptedElement::new("reply")
            .matching(ASSISTANT)
            .text_sequence(["h", "hi", "hi there"]),
    );

    let outcome = executor()
        .execute(
            &page,
            Action::AwaitResponse {
                baseline: ResponseBaseline::default(),
            },
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ActionOutcome::Response {
            text: "hi there".into(),
            attachments: vec![],
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_await_response_ignores_replies_before_baseline() {
    let page = ScriptedPage::new();
    page.insert(ScriptedElement::new("old").matching(ASSISTANT).text("old reply"));

    let err = executor()
        .execute(
            &page,
            Action::AwaitResponse {
                baseline: ResponseBaseline {
                    assistant_messages: 1,
                    images: 0,
                },
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResponseTimeout);
}

#[tokio::test(start_paused = true)]
async fn test_await_response_holds_while_generating() {
    let page = Arc::new(ScriptedPage::new());
    page.insert(ScriptedElement::new("reply").matching(ASSISTANT).text("partial"));
    page.insert(ScriptedElement::new("stop").matching(STOP));

    let remote = page.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        remote.with_model(|m| {
            m.remove("stop");
            if let Some(reply) = m.get_mut("reply") {
                reply.texts = vec!["final answer".into()];
                reply.reads = 0;
            }
        });
    });

    let started = tokio::time::Instant::now();
    let outcome = executor()
        .execute(
            page.as_ref(),
            Action::AwaitResponse {
                baseline: ResponseBaseline::default(),
            },
        )
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(
        outcome,
        ActionOutcome::Response {
            text: "final answer".into(),
            attachments: vec![],
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_await_response_collects_new_images() {
    let page = ScriptedPage::new();
    page.insert(
        ScriptedElement::new("old-img")
            .matching(IMAGE)
            .attr("src", "https://cdn.example/old.png"),
    );
    page.insert(ScriptedElement::new("reply").matching(ASSISTANT).text("Here it is"));
    page.insert(
        ScriptedElement::new("new-img")
            .matching(IMAGE)
            .attr("src", "https://cdn.example/new_thumb.png"),
    );

    let outcome = executor()
        .execute(
            &page,
            Action::AwaitResponse {
                baseline: ResponseBaseline {
                    assistant_messages: 0,
                    images: 1,
                },
            },
        )
        .await
        .unwrap();

    assert_eq!(
        outcome,
        ActionOutcome::Response {
            text: "Here it is".into(),
            attachments: vec!["https://cdn.example/new_thumb.png".into()],
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_action_deadline_maps_to_timeout() {
    let mut config = Config::default();
    config.timeouts = TimeoutsConfig::uniform(1_000);
    let executor = ActionExecutor::new(&config);
    let page = ScriptedPage::new();

    let err = executor
        .execute(
            &page,
            Action::AwaitResponse {
                baseline: ResponseBaseline::default(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AutomationFailure::Timeout {
            class: ActionClass::AwaitResponse,
            timeout_ms: 1_000
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn test_extract_image_runs_resolution_chain() {
    let page = ScriptedPage::new();
    page.insert(
        ScriptedElement::new("img")
            .matching(IMAGE)
            .attr("src", "https://cdn.example/cat_thumb.png"),
    );

    let outcome = executor()
        .execute(&page, Action::ExtractImage { known_url: None })
        .await
        .unwrap();
    let ActionOutcome::Image(resolution) = outcome else {
        panic!("expected image outcome");
    };
    assert_eq!(resolution.resolved_url, "https://cdn.example/cat.png");
}
