//! The interactive loop.
//!
//! Reads one line at a time, dispatches it against the current screen and
//! applies background completions (report generation, diary refresh) before
//! every prompt.

use anyhow::Result;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use timemachine_application::{
    AppEvent, AuthForm, AuthUseCase, ChatOutcome, DeleteOutcome, ReflectionApp,
};
use timemachine_core::diary::EmotionFilter;
use timemachine_core::reflection::Emotion;
use timemachine_core::state::Screen;
use timemachine_core::wizard::WizardStep;
use tokio::sync::mpsc;

use crate::commands::{Command, is_yes};
use crate::helper::CliHelper;
use crate::render;

enum Flow {
    Continue,
    Quit,
}

pub struct Repl {
    app: ReflectionApp,
    auth: AuthUseCase,
    editor: Editor<CliHelper, DefaultHistory>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    filter: EmotionFilter,
    /// Reflection ids in the order the diary was last printed
    listing: Vec<String>,
}

impl Repl {
    pub fn new(app: ReflectionApp, auth: AuthUseCase) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(CliHelper::new()));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            app,
            auth,
            editor,
            events_tx,
            events_rx,
            filter: EmotionFilter::All,
            listing: Vec::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        render::banner();
        if self.app.restore().await? {
            self.app.spawn_diary_refresh(self.events_tx.clone());
        }
        self.show_screen();

        loop {
            self.drain_events().await;
            if let Some(message) = self.app.take_alert() {
                render::alert(&message);
                self.show_screen();
            }

            let readline = self.editor.readline(render::prompt(self.app.screen()));
            match readline {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        self.drain_events().await;
                        self.show_screen();
                        continue;
                    }
                    let _ = self.editor.add_history_entry(trimmed);

                    match trimmed.parse::<Command>() {
                        Ok(command) => match self.handle(command).await {
                            Ok(Flow::Quit) => {
                                println!("{}", "안녕히 가세요.".bright_green());
                                break;
                            }
                            Ok(Flow::Continue) => {}
                            Err(e) => render::alert(&e.to_string()),
                        },
                        Err(e) => render::warn(&e.to_string()),
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "CTRL-C detected. Type '/quit' to exit.".yellow());
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "CTRL-D detected. Exiting...".bright_green());
                    break;
                }
                Err(err) => {
                    eprintln!("{}", format!("Error: {:?}", err).red());
                    break;
                }
            }
        }
        Ok(())
    }

    /// Applies every completion that has arrived; re-renders when the
    /// current screen shows what changed.
    async fn drain_events(&mut self) {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            self.app.apply_event(event).await;
            changed = true;
        }
        if changed && matches!(self.app.screen(), Screen::Report | Screen::Diary) {
            self.show_screen();
        }
    }

    /// Reads a follow-up answer; `None` when the user aborts.
    fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line.trim().to_string())),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn handle(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Quit => return Ok(Flow::Quit),
            Command::Help => render::help(self.app.screen()),
            Command::Status => self.show_status(),
            Command::Login => self.login().await?,
            Command::SignUp => self.sign_up().await?,
            Command::Logout => {
                self.app.logout().await?;
                self.filter = EmotionFilter::All;
                self.show_screen();
            }
            Command::New => {
                self.app.start_new_reflection()?;
                self.show_screen();
            }
            Command::Diary => {
                if self.app.navigate(Screen::Diary) == Screen::Diary {
                    self.app.spawn_diary_refresh(self.events_tx.clone());
                }
                self.show_screen();
            }
            Command::Filter(filter) => {
                if self.app.screen() != Screen::Diary {
                    render::warn("일기 화면에서만 사용할 수 있습니다.");
                } else {
                    self.filter = filter;
                    self.show_screen();
                }
            }
            Command::View(n) => {
                if let Some(id) = self.listed(n) {
                    self.app.view_report(&id)?;
                    self.show_screen();
                }
            }
            Command::Delete(n) => {
                if let Some(id) = self.listed(n) {
                    self.delete(&id).await?;
                }
            }
            Command::Save => {
                if self.app.save_to_diary().await? {
                    render::info("일기에 저장했습니다.");
                    self.show_screen();
                } else {
                    render::warn("리포트 화면의 새 회고만 저장할 수 있습니다.");
                }
            }
            Command::Back => {
                self.app.back();
                self.show_screen();
            }
            Command::End => match self.app.end_simulation() {
                Some(ticket) => {
                    self.app.spawn_report(ticket, self.events_tx.clone());
                    self.show_screen();
                }
                None => render::warn("진행 중인 대화가 없습니다."),
            },
            Command::Extend => self.extend(),
            Command::Text(text) => self.text(&text).await?,
        }
        Ok(Flow::Continue)
    }

    // ============================================================================
    // Auth
    // ============================================================================

    async fn login(&mut self) -> Result<()> {
        if self.app.state().is_logged_in() {
            render::warn("이미 로그인되어 있습니다.");
            return Ok(());
        }
        let Some(login_id) = self.ask("아이디: ")? else {
            return Ok(());
        };
        let Some(password) = self.ask("비밀번호: ")? else {
            return Ok(());
        };
        self.authenticate(AuthForm::login(login_id, password)).await
    }

    async fn sign_up(&mut self) -> Result<()> {
        if self.app.state().is_logged_in() {
            render::warn("이미 로그인되어 있습니다.");
            return Ok(());
        }
        let mut answers = Vec::with_capacity(4);
        for prompt in ["이름: ", "이메일: ", "아이디: ", "비밀번호: "] {
            match self.ask(prompt)? {
                Some(answer) => answers.push(answer),
                None => return Ok(()),
            }
        }
        let [username, email, login_id, password]: [String; 4] = match answers.try_into() {
            Ok(fields) => fields,
            Err(_) => return Ok(()),
        };
        self.authenticate(AuthForm::sign_up(username, email, login_id, password))
            .await
    }

    async fn authenticate(&mut self, form: AuthForm) -> Result<()> {
        render::info("확인하는 중...");
        match self.auth.submit(&form).await {
            Ok(identity) => {
                self.app.login(identity).await?;
                self.filter = EmotionFilter::All;
                self.app.spawn_diary_refresh(self.events_tx.clone());
                self.show_screen();
            }
            Err(failure) => render::alert(&failure.to_string()),
        }
        Ok(())
    }

    // ============================================================================
    // Wizard and simulation
    // ============================================================================

    async fn text(&mut self, text: &str) -> Result<()> {
        match self.app.screen() {
            Screen::Input => self.wizard_answer(text)?,
            Screen::Simulation => self.chat(text).await,
            Screen::Auth => render::auth(),
            _ => render::warn("명령은 '/'로 시작합니다. /help 를 입력해보세요."),
        }
        Ok(())
    }

    fn wizard_answer(&mut self, text: &str) -> Result<()> {
        let Some(wizard) = self.app.wizard_mut() else {
            return Ok(());
        };
        match wizard.step() {
            WizardStep::WhatHappened => wizard.set_what_happened(text),
            WizardStep::Emotion => {
                for token in text.split_whitespace() {
                    if let Ok(intensity) = token.parse::<u8>() {
                        wizard.set_intensity(intensity);
                    } else if let Ok(emotion) = token.parse::<Emotion>() {
                        wizard.toggle_emotion(emotion);
                    } else {
                        render::warn(&format!("목록에 없는 감정입니다: {}", token));
                    }
                }
            }
            WizardStep::WhatYouDid => wizard.set_what_you_did(text),
            WizardStep::DesiredOutcome => wizard.set_desired_outcome(text),
            WizardStep::Persona => {
                let fields: Vec<&str> = text.split('/').map(str::trim).collect();
                match fields.as_slice() {
                    &[name, tone, personality] => wizard.set_persona(name, tone, personality),
                    _ => {
                        render::warn("이름 / 말투 / 성격 세 가지를 '/'로 구분해 입력해주세요.");
                        return Ok(());
                    }
                }
            }
        }

        if wizard.step() != WizardStep::Persona {
            if !wizard.advance() {
                render::warn("조금 더 자세히 입력해주세요.");
            }
            render::wizard(wizard);
            return Ok(());
        }
        if self.app.submit_wizard()? {
            self.show_screen();
        } else {
            render::warn("이름, 말투, 성격을 모두 입력해주세요.");
        }
        Ok(())
    }

    async fn chat(&mut self, text: &str) {
        let before = self
            .app
            .simulation()
            .map_or(0, |simulation| simulation.conversation().len());
        render::info("...");
        let outcome = self.app.send_chat_message(text).await;

        if let Some(simulation) = self.app.simulation() {
            let persona = self.persona_name();
            for message in simulation.conversation().iter().skip(before) {
                if !message.is_user() {
                    render::message(message, &persona);
                }
            }
            render::simulation_status(simulation);
        }
        match outcome {
            ChatOutcome::Replied => {}
            ChatOutcome::ExtendPromptRaised => render::extend_prompt(),
            ChatOutcome::Ignored
                if self
                    .app
                    .simulation()
                    .is_some_and(|simulation| simulation.is_extend_prompt_showing()) =>
            {
                render::extend_prompt()
            }
            ChatOutcome::Ignored => render::warn("지금은 메시지를 보낼 수 없습니다."),
            ChatOutcome::SessionExpired => {}
        }
    }

    fn extend(&mut self) {
        if !self.app.extend_simulation() {
            render::warn("대화 횟수가 남아 있을 때는 연장할 수 없습니다.");
            return;
        }
        if let Some(simulation) = self.app.simulation() {
            render::simulation_status(simulation);
        }
    }

    fn persona_name(&self) -> String {
        self.app
            .state()
            .current_reflection
            .as_ref()
            .map(|r| r.situation.persona_name.clone())
            .unwrap_or_default()
    }

    // ============================================================================
    // Diary
    // ============================================================================

    fn listed(&self, n: usize) -> Option<String> {
        if self.app.screen() != Screen::Diary {
            render::warn("일기 화면에서만 사용할 수 있습니다. /diary");
            return None;
        }
        let id = self.listing.get(n - 1).cloned();
        if id.is_none() {
            render::warn(&format!("{}번 회고가 없습니다.", n));
        }
        id
    }

    async fn delete(&mut self, reflection_id: &str) -> Result<()> {
        self.app.request_delete(reflection_id)?;
        let confirmed = self
            .ask("이 회고를 삭제할까요? (yes/no) ")?
            .is_some_and(|answer| is_yes(&answer));
        if !confirmed {
            self.app.cancel_delete();
            render::info("삭제를 취소했습니다.");
            return Ok(());
        }
        match self.app.confirm_delete().await {
            DeleteOutcome::Deleted => {
                render::info("삭제했습니다.");
                self.show_screen();
            }
            // alert is raised by the controller
            DeleteOutcome::Failed | DeleteOutcome::NothingPending => {}
        }
        Ok(())
    }

    // ============================================================================
    // Rendering
    // ============================================================================

    fn show_screen(&mut self) {
        match self.app.screen() {
            Screen::Auth => render::auth(),
            Screen::Home => render::home(self.app.identity(), self.app.state().diary.len()),
            Screen::Input => {
                if let Some(wizard) = self.app.wizard() {
                    render::wizard(wizard);
                }
            }
            Screen::Simulation => {
                let persona = self.persona_name();
                if let Some(simulation) = self.app.simulation() {
                    println!(
                        "{}",
                        format!("{}님과의 대화를 다시 시작합니다.", persona)
                            .bright_magenta()
                            .bold()
                    );
                    for message in simulation.conversation() {
                        render::message(message, &persona);
                    }
                    render::simulation_status(simulation);
                    if simulation.is_extend_prompt_showing() {
                        render::extend_prompt();
                    }
                }
            }
            Screen::Report => {
                let state = self.app.state();
                if let Some(reflection) = state.report_subject() {
                    render::report(reflection, state.is_viewing_history());
                }
            }
            Screen::Diary => {
                let entries = self.app.diary_view(self.filter);
                self.listing = entries.iter().map(|r| r.id.clone()).collect();
                render::diary(
                    &entries,
                    self.filter,
                    self.app.is_diary_refresh_in_flight(),
                );
            }
        }
    }

    fn show_status(&self) {
        let state = self.app.state();
        println!("screen: {}", state.screen.to_string().bright_cyan());
        match self.app.identity() {
            Some(identity) => println!("user: {} ({})", identity.display_name(), identity.login_id),
            None => println!("user: -"),
        }
        println!("diary: {}", state.diary.len());
        println!("filter: {}", self.filter);
        if let Some(simulation) = self.app.simulation() {
            render::simulation_status(simulation);
        }
    }
}
