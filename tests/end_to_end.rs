//! Coordinator and automation service wired together over their channels,
//! driving a scripted chat page.

use std::sync::Arc;

use pagepilot_automation::{ActionExecutor, AutomationService, ScriptedElement, ScriptedPage};
use pagepilot_config::Config;
use pagepilot_coordinator::{AggregateStore, AutomationLink, Coordinator, MemoryKvStore};
use pagepilot_protocol::{
    ChatId, Command, CommandResult, CorrelationId, DomainEvent, Envelope, Image,
    ResolutionStrategy, ResultEnvelope,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// A chat page whose reply carries a generated picture at `image_src`.
fn chat_page(reply: &'static str, image_src: Option<&'static str>) -> ScriptedPage {
    let page = ScriptedPage::new();
    page.insert(ScriptedElement::new("input").matching("#prompt-textarea"));
    page.insert(
        ScriptedElement::new("send")
            .matching("[data-testid='send-button']")
            .disabled(),
    );
    page.on_input("input", |m| m.enable("send"));
    page.on_click("send", move |m| {
        m.insert(
            ScriptedElement::new("reply")
                .matching("[data-message-author-role='assistant']")
                .text(reply),
        );
        if let Some(src) = image_src {
            m.insert(
                ScriptedElement::new("thumb")
                    .matching("[data-testid='generated-image'] img")
                    .attr("src", src),
            );
        }
    });
    page
}

/// A chat page that answers every prompt with "re: " and the prompt text.
fn echo_page() -> ScriptedPage {
    let page = ScriptedPage::new();
    page.insert(ScriptedElement::new("input").matching("#prompt-textarea"));
    page.insert(ScriptedElement::new("send").matching("[data-testid='send-button']"));
    page.on_click("send", |m| {
        let prompt = m
            .get_mut("input")
            .map(|e| e.content.clone())
            .unwrap_or_default();
        m.insert(
            ScriptedElement::new("reply")
                .matching("[data-message-author-role='assistant']")
                .text(format!("re: {}", prompt)),
        );
    });
    page
}

struct App {
    coordinator: Arc<Coordinator>,
    shutdown: CancellationToken,
}

impl App {
    fn start(page: ScriptedPage) -> Self {
        let config = Config::default();
        let (link, endpoint) = AutomationLink::channel(&config.timeouts, 16);
        let store = AggregateStore::new(Arc::new(MemoryKvStore::new()), 100);
        let coordinator = Arc::new(Coordinator::new(store, link, &config.limits));

        let shutdown = CancellationToken::new();
        let service = AutomationService::new(ActionExecutor::new(&config), Arc::new(page));
        tokio::spawn(service.serve(endpoint.actions, endpoint.outcomes, shutdown.clone()));

        Self {
            coordinator,
            shutdown,
        }
    }

    async fn ok(&self, command: Command) -> CommandResult {
        let envelope = Envelope::wrap(CorrelationId::new(), &command).unwrap();
        self.coordinator
            .handle(envelope)
            .await
            .into_result::<CommandResult>()
            .unwrap()
    }

    async fn chat(&self) -> ChatId {
        let CommandResult::Project(project) = self
            .ok(Command::CreateProject {
                name: "Research".into(),
            })
            .await
        else {
            panic!("expected project");
        };
        let CommandResult::Chat(chat) = self
            .ok(Command::CreateChat {
                project_id: project.id,
                title: Some("Q1".into()),
            })
            .await
        else {
            panic!("expected chat");
        };
        chat.id
    }

    async fn draw_and_download(&self, chat_id: &ChatId) -> Image {
        let CommandResult::Exchange(exchange) = self
            .ok(Command::RequestImage {
                chat_id: chat_id.clone(),
                prompt: "a cat".into(),
                style: Some("watercolor".into()),
            })
            .await
        else {
            panic!("expected exchange");
        };
        assert!(exchange.assistant.is_image_generation);

        let CommandResult::Image(image) = self
            .ok(Command::DownloadImage {
                chat_id: chat_id.clone(),
            })
            .await
        else {
            panic!("expected image");
        };
        image
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[tokio::test(start_paused = true)]
async fn test_prompt_round_trip_through_page() {
    let app = App::start(chat_page("hi there", None));
    let mut events = app.coordinator.subscribe();
    let chat_id = app.chat().await;

    let CommandResult::Exchange(exchange) = app
        .ok(Command::SendPrompt {
            chat_id: chat_id.clone(),
            text: "hello".into(),
        })
        .await
    else {
        panic!("expected exchange");
    };
    assert_eq!(exchange.user.content.text, "hello");
    assert_eq!(exchange.assistant.content.text, "hi there");
    assert!(!app.coordinator.is_busy(&chat_id));

    let mut appended = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, DomainEvent::MessageAppended { .. }) {
            appended += 1;
        }
    }
    assert_eq!(appended, 2);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_chats_keep_their_own_replies() {
    let app = App::start(echo_page());
    let a = app.chat().await;
    let b = app.chat().await;

    let prompt = |chat_id: &ChatId, text: &str| Command::SendPrompt {
        chat_id: chat_id.clone(),
        text: text.into(),
    };
    let (first, second) = tokio::join!(app.ok(prompt(&a, "alpha")), app.ok(prompt(&b, "beta")));

    for (result, text) in [(first, "alpha"), (second, "beta")] {
        let CommandResult::Exchange(exchange) = result else {
            panic!("expected exchange");
        };
        assert_eq!(exchange.user.content.text, text);
        assert_eq!(exchange.assistant.content.text, format!("re: {}", text));
    }
}

#[tokio::test(start_paused = true)]
async fn test_image_resolved_by_rewrite_after_earlier_strategies_miss() {
    let app = App::start(chat_page(
        "here is your cat",
        Some("https://files.example/gen/cat_thumb.webp?sig=abc"),
    ));
    let chat_id = app.chat().await;

    let image = app.draw_and_download(&chat_id).await;
    assert_eq!(image.original_url, "https://files.example/gen/cat_thumb.webp?sig=abc");
    assert_eq!(
        image.resolved_url.as_deref(),
        Some("https://files.example/gen/cat.webp")
    );
    assert_eq!(image.strategy, Some(ResolutionStrategy::UrlRewrite));
    assert!(!image.degraded);
    assert_eq!(image.download_url(), "https://files.example/gen/cat.webp");
}

#[tokio::test(start_paused = true)]
async fn test_unresolvable_image_is_degraded() {
    let app = App::start(chat_page("here is your cat", Some("https://files.example/gen/cat.png")));
    let chat_id = app.chat().await;

    let image = app.draw_and_download(&chat_id).await;
    assert!(image.degraded);
    assert_eq!(image.strategy, Some(ResolutionStrategy::RawFallback));
    assert_eq!(image.download_url(), "https://files.example/gen/cat.png");

    let snapshot = app.coordinator.snapshot().await;
    assert_eq!(snapshot.projects[0].images, vec![image]);
}

#[tokio::test(start_paused = true)]
async fn test_served_over_channels() {
    let app = App::start(chat_page("hi there", None));
    let (command_tx, command_rx) = mpsc::channel(8);
    let (reply_tx, mut reply_rx) = mpsc::channel::<ResultEnvelope>(8);
    tokio::spawn(
        app.coordinator
            .clone()
            .serve(command_rx, reply_tx, app.shutdown.clone()),
    );

    let id = CorrelationId::from("ui-check");
    command_tx
        .send(Envelope::wrap(id.clone(), &Command::CheckInterface {}).unwrap())
        .await
        .unwrap();

    let reply = reply_rx.recv().await.unwrap();
    assert_eq!(reply.correlation_id, id);
    let CommandResult::Interface(status) = reply.into_result::<CommandResult>().unwrap() else {
        panic!("expected interface status");
    };
    assert!(status.ready);
}
