//! Drives the automation service over its channels the way the coordinator
//! does, against a scripted chat page.
//!
//! `test_live_chrome_prepare` needs Chrome with `--remote-debugging-port=9222`
//! and a logged-in tab of the target site:
//! cargo test -p pagepilot-automation --test service_flow -- --ignored --nocapture

use std::sync::Arc;

use pagepilot_automation::{
    ActionExecutor, AutomationService, CdpClient, CdpPage, ScriptedElement, ScriptedPage,
};
use pagepilot_config::Config;
use pagepilot_protocol::{
    Action, ActionOutcome, CorrelationId, Envelope, ResolutionStrategy, ResultEnvelope,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A chat page that answers "hi there" with one generated thumbnail.
fn chat_page() -> ScriptedPage {
    let page = ScriptedPage::new();
    page.insert(ScriptedElement::new("input").matching("#prompt-textarea"));
    page.insert(
        ScriptedElement::new("send")
            .matching("[data-testid='send-button']")
            .disabled(),
    );
    page.on_input("input", |m| m.enable("send"));
    page.on_click("send", |m| {
        m.insert(
            ScriptedElement::new("reply")
                .matching("[data-message-author-role='assistant']")
                .text_sequence(["hi", "hi there"]),
        );
        m.insert(
            ScriptedElement::new("thumb")
                .matching("[data-testid='generated-image'] img")
                .attr("src", "https://files.example/gen/cat_thumb.webp?sig=abc"),
        );
    });
    page
}

struct Harness {
    actions: mpsc::Sender<Envelope>,
    outcomes: mpsc::Receiver<ResultEnvelope>,
    shutdown: CancellationToken,
}

impl Harness {
    fn start(page: ScriptedPage) -> Self {
        let (action_tx, action_rx) = mpsc::channel(8);
        let (outcome_tx, outcome_rx) = mpsc::channel(8);
        let shutdown = CancellationToken::new();
        let service =
            AutomationService::new(ActionExecutor::new(&Config::default()), Arc::new(page));
        tokio::spawn(service.serve(action_rx, outcome_tx, shutdown.clone()));

        Self {
            actions: action_tx,
            outcomes: outcome_rx,
            shutdown,
        }
    }

    async fn run(&mut self, action: Action) -> ResultEnvelope {
        let id = CorrelationId::new();
        self.actions
            .send(Envelope::wrap(id.clone(), &action).unwrap())
            .await
            .unwrap();
        let reply = self.outcomes.recv().await.unwrap();
        assert_eq!(reply.correlation_id, id);
        reply
    }
}

#[tokio::test(start_paused = true)]
async fn test_prompt_response_and_image_extraction() {
    let mut harness = Harness::start(chat_page());

    let ready = harness.run(Action::PrepareInterface {}).await;
    assert!(ready.is_ok());

    let submitted: ActionOutcome = harness
        .run(Action::SubmitPrompt {
            text: "hello".into(),
        })
        .await
        .into_result()
        .unwrap();
    let ActionOutcome::Submitted { baseline } = submitted else {
        panic!("expected Submitted, got {:?}", submitted);
    };

    let response: ActionOutcome = harness
        .run(Action::AwaitResponse { baseline })
        .await
        .into_result()
        .unwrap();
    assert_eq!(
        response,
        ActionOutcome::Response {
            text: "hi there".into(),
            attachments: vec!["https://files.example/gen/cat_thumb.webp?sig=abc".into()],
        }
    );

    let image: ActionOutcome = harness
        .run(Action::ExtractImage { known_url: None })
        .await
        .into_result()
        .unwrap();
    let ActionOutcome::Image(resolution) = image else {
        panic!("expected Image outcome");
    };
    assert_eq!(resolution.strategy, ResolutionStrategy::UrlRewrite);
    assert_eq!(resolution.resolved_url, "https://files.example/gen/cat.webp");

    harness.shutdown.cancel();
}

#[tokio::test(start_paused = true)]
async fn test_failures_travel_as_error_envelopes() {
    let mut harness = Harness::start(ScriptedPage::new());

    let reply = harness.run(Action::PrepareInterface {}).await;
    assert!(!reply.is_ok());
    let err = reply.into_result::<ActionOutcome>().unwrap_err();
    assert_eq!(err.kind, pagepilot_protocol::ErrorKind::InterfaceNotReady);
    assert!(err.kind.is_site_structure());

    harness.shutdown.cancel();
}

#[tokio::test]
#[ignore = "requires Chrome with remote debugging and an open target tab"]
async fn test_live_chrome_prepare() {
    let config = Config::default();
    let client = Arc::new(
        CdpClient::connect(&config.automation.endpoint)
            .await
            .expect("Chrome should be reachable"),
    );
    let page = CdpPage::attach(client, &config.automation.target_url)
        .await
        .expect("target tab should be open");

    let outcome = ActionExecutor::new(&config)
        .execute(&page, Action::PrepareInterface {})
        .await
        .expect("prompt input should render");
    assert_eq!(outcome, ActionOutcome::Ready {});
}
