use crate::commands::{CommandContext, CommandDispatcher, CommandOutcome};
use crate::config::Config;
use crate::core::error::HubError;
use crate::display;
use crate::input::{InputEvent, InputSource};
use crate::providers::LLMProvider;
use crate::session::{Session, Turn};
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{BoxStream, StreamExt};
use std::io::Write;
use std::path::PathBuf;

/// Produces a future that resolves when the user asks to stop the
/// response being streamed.
pub type InterruptSource = fn() -> BoxFuture<'static, ()>;

/// How consuming a response stream ended.
#[derive(Debug)]
enum StreamOutcome {
    Completed(String),
    Cancelled,
    Failed(HubError),
}

pub struct Application {
    config: Config,
    provider: Box<dyn LLMProvider>,
    dispatcher: CommandDispatcher,
    export_dir: PathBuf,
    interrupt: InterruptSource,
}

impl Application {
    pub fn new(
        config: Config,
        provider: Box<dyn LLMProvider>,
        dispatcher: CommandDispatcher,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            config,
            provider,
            dispatcher,
            export_dir,
            interrupt: ctrl_c,
        }
    }

    pub fn with_interrupt(mut self, interrupt: InterruptSource) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Runs the REPL until `/exit`, a confirmed interrupt or end of input.
    pub async fn run_interactive(
        &mut self,
        session: &mut Session,
        input: &mut dyn InputSource,
        out: &mut dyn Write,
    ) -> Result<(), HubError> {
        display::print_welcome(out, self.provider.model_name())?;
        let prompt = display::prompt();

        loop {
            writeln!(out)?;
            let line = match input.read_line(&prompt)? {
                InputEvent::Line(line) => line,
                InputEvent::Interrupted => {
                    writeln!(out)?;
                    if confirm_exit(input)? {
                        break;
                    }
                    continue;
                }
                InputEvent::Eof => break,
            };

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('/') {
                input.add_history(line);
                let mut ctx = CommandContext {
                    session: &mut *session,
                    provider: self.provider.as_ref(),
                    config: &mut self.config,
                    input: &mut *input,
                    out: &mut *out,
                    export_dir: &self.export_dir,
                };
                match self.dispatcher.execute(line, &mut ctx).await {
                    Ok(CommandOutcome::Exit) => break,
                    Ok(CommandOutcome::Continue) => {}
                    Err(e) => display::print_error(out, &e.to_string())?,
                }
                continue;
            }

            self.process_message(session, line, out).await?;
        }

        tracing::debug!(turns = session.history().len(), "interactive session ended");
        Ok(())
    }

    /// Streams the answer to `message`, echoing each chunk, and records the
    /// turn only when the whole response arrived.
    pub async fn process_message(
        &self,
        session: &mut Session,
        message: &str,
        out: &mut dyn Write,
    ) -> Result<(), HubError> {
        display::print_info(out, "\nThinking...")?;
        let mut cancel = (self.interrupt)();

        let started = tokio::select! {
            biased;
            _ = &mut cancel => {
                display::print_info(out, "Response interrupted")?;
                return Ok(());
            }
            started = self.provider.chat_stream(message, session.system_prompt()) => started,
        };

        let stream = match started {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                display::print_error(out, &e.to_string())?;
                return Ok(());
            }
        };

        writeln!(out, "\nResponse:")?;
        match consume_stream(stream, out, cancel).await? {
            StreamOutcome::Completed(answer) => {
                writeln!(out, "\n")?;
                session.record_turn(Turn::new(message, answer));
            }
            StreamOutcome::Cancelled => {
                writeln!(out)?;
                display::print_info(out, "Response interrupted")?;
            }
            StreamOutcome::Failed(e) => {
                tracing::warn!(error = %e, "response stream failed");
                writeln!(out)?;
                display::print_error(out, &e.to_string())?;
            }
        }
        Ok(())
    }

    /// Sends a single prompt without streaming and renders the answer.
    pub async fn run_once(&self, prompt: &str, out: &mut dyn Write) -> Result<(), HubError> {
        let response = self
            .provider
            .chat(prompt, self.config.system_prompt())
            .await?;
        display::display_answer(out, &response)?;
        Ok(())
    }
}

/// Echoes chunks as they arrive until the stream ends, fails, or `cancel`
/// resolves. `cancel` is checked before every chunk, so nothing more is
/// printed once it fired, even when further chunks are already buffered.
async fn consume_stream(
    mut stream: BoxStream<'static, Result<String, HubError>>,
    out: &mut dyn Write,
    mut cancel: BoxFuture<'static, ()>,
) -> Result<StreamOutcome, HubError> {
    let mut answer = String::new();
    loop {
        tokio::select! {
            biased;
            _ = &mut cancel => return Ok(StreamOutcome::Cancelled),
            item = stream.next() => match item {
                Some(Ok(chunk)) => {
                    display::write_chunk(out, &chunk)?;
                    answer.push_str(&chunk);
                }
                Some(Err(e)) => return Ok(StreamOutcome::Failed(e)),
                None => return Ok(StreamOutcome::Completed(answer)),
            },
        }
    }
}

/// Asks whether to leave after an interrupt at the prompt. Only an answer
/// starting with `y` exits; a second interrupt or end of input also exits.
fn confirm_exit(input: &mut dyn InputSource) -> Result<bool, HubError> {
    match input.read_line("Are you sure you want to exit? (y/N): ")? {
        InputEvent::Line(answer) => Ok(answer.trim().to_lowercase().starts_with('y')),
        InputEvent::Interrupted | InputEvent::Eof => Ok(true),
    }
}

fn ctrl_c() -> BoxFuture<'static, ()> {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl-C");
            future::pending::<()>().await;
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create_command_registry;
    use crate::config::Provider;
    use crate::input::LineInput;
    use crate::session::SUMMARY_MARKER;
    use crate::testing::{MockProvider, Reply, chunks};
    use std::collections::HashMap;
    use std::io::{self, Cursor};
    use std::sync::Arc;

    fn never() -> BoxFuture<'static, ()> {
        future::pending().boxed()
    }

    fn immediately() -> BoxFuture<'static, ()> {
        future::ready(()).boxed()
    }

    fn shortly() -> BoxFuture<'static, ()> {
        tokio::time::sleep(std::time::Duration::from_millis(20)).boxed()
    }

    thread_local! {
        static FIRED: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
    }

    /// Interrupts the first message of the test only.
    fn first_only() -> BoxFuture<'static, ()> {
        if FIRED.with(|fired| fired.replace(true)) {
            never()
        } else {
            immediately()
        }
    }

    struct Run {
        out: String,
        session: Session,
        _dir: tempfile::TempDir,
    }

    /// Shares one mock between the application and the test.
    struct Shared(Arc<MockProvider>);

    #[async_trait::async_trait]
    impl LLMProvider for Shared {
        fn kind(&self) -> Provider {
            self.0.kind()
        }
        fn model_name(&self) -> &str {
            self.0.model_name()
        }
        fn max_tokens(&self) -> u32 {
            self.0.max_tokens()
        }
        async fn chat(&self, m: &str, s: Option<&str>) -> Result<String, HubError> {
            self.0.chat(m, s).await
        }
        async fn chat_stream(
            &self,
            m: &str,
            s: Option<&str>,
        ) -> Result<BoxStream<'static, Result<String, HubError>>, HubError> {
            self.0.chat_stream(m, s).await
        }
    }

    async fn drive(
        mock: Arc<MockProvider>,
        interrupt: InterruptSource,
        session: Session,
        script: Vec<InputEvent>,
    ) -> Run {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(dir.path().join("config.yaml"), HashMap::new());
        let mut app = Application::new(
            config,
            Box::new(Shared(mock)),
            create_command_registry(),
            dir.path().to_path_buf(),
        )
        .with_interrupt(interrupt);

        let mut session = session;
        let mut input = Scripted(script.into_iter().collect());
        let mut out = Vec::new();
        app.run_interactive(&mut session, &mut input, &mut out)
            .await
            .unwrap();
        Run {
            out: String::from_utf8(out).unwrap(),
            session,
            _dir: dir,
        }
    }

    /// Replays input events, then reports end of input.
    struct Scripted(std::collections::VecDeque<InputEvent>);

    impl InputSource for Scripted {
        fn read_line(&mut self, _prompt: &str) -> Result<InputEvent, HubError> {
            Ok(self.0.pop_front().unwrap_or(InputEvent::Eof))
        }
    }

    fn line(text: &str) -> InputEvent {
        InputEvent::Line(text.to_string())
    }

    #[tokio::test]
    async fn streamed_answer_becomes_a_turn() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["4", "."])]));
        let run = drive(mock.clone(), never, Session::new(), vec![line("What is 2+2?")]).await;

        assert!(run.out.contains("4."));
        assert_eq!(run.session.history(), &[Turn::new("What is 2+2?", "4.")]);
        assert_eq!(mock.calls(), vec![("What is 2+2?".to_string(), None)]);
    }

    #[tokio::test]
    async fn each_exchange_adds_one_turn_in_order() {
        let mock = Arc::new(MockProvider::new(vec![
            chunks(&["a"]),
            chunks(&["b"]),
            chunks(&["c"]),
        ]));
        let script = vec![line("first"), line("second"), line("third")];
        let run = drive(mock.clone(), never, Session::new(), script).await;

        assert_eq!(
            run.session.history(),
            &[
                Turn::new("first", "a"),
                Turn::new("second", "b"),
                Turn::new("third", "c"),
            ]
        );
        assert_eq!(mock.calls().len(), 3);
    }

    #[tokio::test]
    async fn failed_exchange_is_not_fatal() {
        let mock = Arc::new(MockProvider::new(vec![
            Reply::Fail(HubError::Network("connection refused".into())),
            chunks(&["ok"]),
        ]));
        let run = drive(mock, never, Session::new(), vec![line("first"), line("second")]).await;

        assert!(run.out.contains("Grok API error:"));
        assert_eq!(run.session.history(), &[Turn::new("second", "ok")]);
    }

    #[tokio::test]
    async fn mid_stream_failure_leaves_partial_text_and_no_turn() {
        let mock = Arc::new(MockProvider::new(vec![Reply::Chunks(vec![
            Ok("partial".to_string()),
            Err(HubError::Api("reset".into())),
        ])]));
        let run = drive(mock, never, Session::new(), vec![line("q")]).await;

        assert!(run.out.contains("partial"));
        assert!(run.out.contains("Grok API error: reset"));
        assert!(run.session.history().is_empty());
    }

    #[tokio::test]
    async fn system_prompt_reaches_provider() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["Yes."])]));
        let run = drive(
            mock.clone(),
            never,
            Session::new(),
            vec![line("/system You are Terse"), line("Hi")],
        )
        .await;

        assert_eq!(
            mock.calls(),
            vec![("Hi".to_string(), Some("You are Terse".to_string()))]
        );
        assert_eq!(run.session.history().len(), 1);
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let mock = Arc::new(MockProvider::new(vec![]));
        let run = drive(mock.clone(), never, Session::new(), vec![line(""), line("   ")]).await;
        assert!(mock.calls().is_empty());
        assert!(run.session.history().is_empty());
    }

    #[tokio::test]
    async fn exit_stops_before_later_lines() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["never"])]));
        let run = drive(mock.clone(), never, Session::new(), vec![line("/exit"), line("hello")]).await;
        assert!(mock.calls().is_empty());
        assert!(run.session.history().is_empty());
    }

    #[tokio::test]
    async fn compact_then_chat() {
        let mut session = Session::new();
        session.record_turn(Turn::new("one", "1"));
        let mock = Arc::new(MockProvider::new(vec![chunks(&["summary"]), chunks(&["next"])]));
        let run = drive(mock, never, session, vec![line("/compact"), line("more")]).await;

        assert_eq!(
            run.session.history(),
            &[Turn::new(SUMMARY_MARKER, "summary"), Turn::new("more", "next")]
        );
    }

    #[tokio::test]
    async fn interrupt_then_no_keeps_running() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["hi"])]));
        let run = drive(
            mock,
            never,
            Session::new(),
            vec![InputEvent::Interrupted, line("n"), line("hello")],
        )
        .await;
        assert_eq!(run.session.history(), &[Turn::new("hello", "hi")]);
    }

    #[tokio::test]
    async fn interrupt_then_yes_exits() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["hi"])]));
        let run = drive(
            mock.clone(),
            never,
            Session::new(),
            vec![InputEvent::Interrupted, line("Yes"), line("hello")],
        )
        .await;
        assert!(mock.calls().is_empty());
        assert!(run.session.history().is_empty());
    }

    #[tokio::test]
    async fn second_interrupt_during_confirmation_exits() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["hi"])]));
        let run = drive(
            mock.clone(),
            never,
            Session::new(),
            vec![InputEvent::Interrupted, InputEvent::Interrupted, line("hello")],
        )
        .await;
        assert!(mock.calls().is_empty());
        assert!(run.session.history().is_empty());
    }

    #[tokio::test]
    async fn interrupt_then_next_message_works() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["after"])]));
        let run = drive(mock.clone(), first_only, Session::new(), vec![line("slow"), line("fast")]).await;

        assert!(run.out.contains("Response interrupted"));
        assert_eq!(run.session.history(), &[Turn::new("fast", "after")]);
        assert_eq!(mock.calls(), vec![("fast".to_string(), None)]);
    }

    #[tokio::test]
    async fn interrupted_stream_keeps_partial_text_only_on_screen() {
        let mock = Arc::new(MockProvider::new(vec![Reply::Stall(vec!["PARTIAL".to_string()])]));
        let run = drive(mock, shortly, Session::new(), vec![line("slow")]).await;

        assert!(run.out.contains("PARTIAL"));
        assert!(run.out.contains("Response interrupted"));
        assert!(run.session.history().is_empty());
    }

    #[tokio::test]
    async fn interrupt_drops_buffered_chunks() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["CHUNK1", "CHUNK2"])]));
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(dir.path().join("config.yaml"), HashMap::new());
        let app = Application::new(
            config,
            Box::new(Shared(mock)),
            create_command_registry(),
            dir.path().to_path_buf(),
        )
        .with_interrupt(immediately);

        let mut session = Session::new();
        let mut out = Vec::new();
        let stream = app.provider.chat_stream("q", None).await.unwrap();
        let outcome = consume_stream(stream, &mut out, immediately()).await.unwrap();

        assert!(matches!(outcome, StreamOutcome::Cancelled));
        assert!(out.is_empty());
        app.process_message(&mut session, "q", &mut out).await.unwrap();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn one_shot_uses_configured_system_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "system_prompt: Be brief\n").unwrap();
        let config = Config::load_with_env(path, HashMap::new());
        let mock = Arc::new(MockProvider::new(vec![chunks(&["Four"])]));
        let app = Application::new(
            config,
            Box::new(Shared(mock.clone())),
            create_command_registry(),
            dir.path().to_path_buf(),
        );

        let mut out = Vec::new();
        app.run_once("2+2?", &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Four"));
        assert_eq!(
            mock.calls(),
            vec![("2+2?".to_string(), Some("Be brief".to_string()))]
        );
    }

    #[tokio::test]
    async fn undecodable_line_does_not_end_the_session() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["a"]), chunks(&["b"])]));
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(dir.path().join("config.yaml"), HashMap::new());
        let mut app = Application::new(
            config,
            Box::new(Shared(mock)),
            create_command_registry(),
            dir.path().to_path_buf(),
        )
        .with_interrupt(never);

        let mut session = Session::new();
        let mut input = LineInput::new(Cursor::new(b"caf\xe9\nhello\n".to_vec()), io::sink());
        let mut out = Vec::new();
        app.run_interactive(&mut session, &mut input, &mut out)
            .await
            .unwrap();

        assert_eq!(
            session.history(),
            &[Turn::new("caf\u{FFFD}", "a"), Turn::new("hello", "b")]
        );
    }

    #[tokio::test]
    async fn piped_input_drives_the_loop() {
        let mock = Arc::new(MockProvider::new(vec![chunks(&["4", "."])]));
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_with_env(dir.path().join("config.yaml"), HashMap::new());
        let mut app = Application::new(
            config,
            Box::new(Shared(mock)),
            create_command_registry(),
            dir.path().to_path_buf(),
        )
        .with_interrupt(never);

        let mut session = Session::new();
        let mut input = LineInput::new(Cursor::new("What is 2+2?\n/history\n"), io::sink());
        let mut out = Vec::new();
        app.run_interactive(&mut session, &mut input, &mut out)
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1. User: What is 2+2?"));
        assert_eq!(session.history().len(), 1);
    }
}
