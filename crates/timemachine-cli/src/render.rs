//! Terminal rendering of the screens.

use colored::Colorize;
use timemachine_core::diary::EmotionFilter;
use timemachine_core::reflection::{Emotion, EmotionGroup, Message, Reflection, Sender};
use timemachine_core::simulation::SimulationSession;
use timemachine_core::state::Screen;
use timemachine_core::user::Identity;
use timemachine_core::wizard::{MAX_INTENSITY, MIN_INTENSITY, SituationWizard, WizardStep};

pub fn banner() {
    println!("{}", "=== TimeMachine ===".bright_magenta().bold());
    println!(
        "{}",
        "지난 대화를 다시 해보고 회고 리포트를 받아보세요. '/help'로 명령을 확인할 수 있습니다."
            .bright_black()
    );
    println!();
}

/// Prompt shown by the editor for each screen.
pub fn prompt(screen: Screen) -> &'static str {
    match screen {
        Screen::Auth => "auth> ",
        Screen::Home => "home> ",
        Screen::Input => "input> ",
        Screen::Simulation => "you> ",
        Screen::Report => "report> ",
        Screen::Diary => "diary> ",
    }
}

pub fn help(screen: Screen) {
    let lines: &[(&str, &str)] = match screen {
        Screen::Auth => &[("/login", "로그인"), ("/signup", "회원가입")],
        Screen::Home => &[
            ("/new", "새 회고 시작"),
            ("/diary", "회고 일기 보기"),
            ("/logout", "로그아웃"),
        ],
        Screen::Input => &[
            ("<텍스트>", "현재 단계에 답하기"),
            ("/back", "이전 단계 (첫 단계에서는 취소)"),
        ],
        Screen::Simulation => &[
            ("<텍스트>", "메시지 보내기"),
            ("/extend", "대화 연장"),
            ("/end", "대화 종료 후 리포트 생성"),
            ("/back", "회고 취소하고 홈으로"),
        ],
        Screen::Report => &[
            ("/save", "일기에 저장"),
            ("/back", "돌아가기"),
            ("/new", "새 회고 시작"),
        ],
        Screen::Diary => &[
            ("/filter <감정|all>", "감정으로 거르기"),
            ("/view <번호>", "회고 보기"),
            ("/delete <번호>", "회고 삭제"),
            ("/new", "새 회고 시작"),
            ("/back", "홈으로"),
        ],
    };
    for (cmd, text) in lines {
        println!("  {:<20} {}", cmd.bright_cyan(), text);
    }
    println!("  {:<20} {}", "/status".bright_cyan(), "현재 상태");
    println!("  {:<20} {}", "/quit".bright_cyan(), "종료");
}

pub fn auth() {
    println!("{}", "로그인이 필요합니다. /login 또는 /signup".bright_yellow());
}

pub fn home(identity: Option<&Identity>, diary_len: usize) {
    let name = identity.map(Identity::display_name).unwrap_or("손님");
    println!("{}", format!("{}님, 안녕하세요.", name).bright_green());
    println!(
        "{}",
        format!("저장된 회고 {}개 · /new 로 새 회고를 시작하세요.", diary_len).bright_black()
    );
}

pub fn alert(message: &str) {
    println!("{}", format!("[알림] {}", message).bright_red().bold());
}

pub fn info(message: &str) {
    println!("{}", message.bright_black());
}

pub fn warn(message: &str) {
    println!("{}", message.yellow());
}

pub fn wizard(wizard: &SituationWizard) {
    let step = wizard.step();
    let title = match step {
        WizardStep::WhatHappened => "어떤 일이 있었나요?",
        WizardStep::Emotion => "그때 어떤 감정을 느꼈나요?",
        WizardStep::WhatYouDid => "그때 어떻게 행동했나요?",
        WizardStep::DesiredOutcome => "어떻게 흘러갔으면 좋았을까요?",
        WizardStep::Persona => "대화 상대는 어떤 사람인가요?",
    };
    println!(
        "{}",
        format!("[{}/{}] {}", step.number(), WizardStep::COUNT, title)
            .bright_magenta()
            .bold()
    );
    match step {
        WizardStep::Emotion => {
            emotions(wizard);
            info(&format!(
                "감정 이름과 강도({}-{})를 입력하세요. 예: 서운함 7",
                MIN_INTENSITY, MAX_INTENSITY
            ));
        }
        WizardStep::Persona => info("이름 / 말투 / 성격 순으로 '/'로 구분해 입력하세요."),
        _ => info("다섯 글자보다 길게 적어주세요."),
    }
}

fn emotions(wizard: &SituationWizard) {
    let draft = wizard.draft();
    for group in [
        EmotionGroup::Positive,
        EmotionGroup::Negative,
        EmotionGroup::Neutral,
    ] {
        let tags: Vec<String> = Emotion::all()
            .into_iter()
            .filter(|e| e.group() == group)
            .map(|e| {
                if draft.emotions.contains(&e) {
                    format!("[{}]", e).bright_green().to_string()
                } else {
                    e.to_string()
                }
            })
            .collect();
        println!("  {} {}", format!("{}:", group).bold(), tags.join(" "));
    }
    println!("  강도: {}", draft.emotion_intensity);
}

pub fn message(message: &Message, persona: &str) {
    match message.sender {
        Sender::User => println!("{}", format!("나: {}", message.text).green()),
        Sender::Ai => {
            println!("{}", format!("[{}]", persona).bright_magenta());
            for line in message.text.lines() {
                println!("{}", line.bright_blue());
            }
        }
    }
}

pub fn simulation_status(simulation: &SimulationSession) {
    let left = simulation.turns_left().max(0);
    println!(
        "{}",
        format!(
            "남은 대화 {}회 ({}/{})",
            left,
            simulation.user_turns(),
            simulation.turn_cap()
        )
        .bright_black()
    );
}

pub fn extend_prompt() {
    println!(
        "{}",
        "대화 횟수를 모두 사용했습니다. /extend 로 연장하거나 /end 로 마치세요.".bright_yellow()
    );
}

pub fn report(reflection: &Reflection, viewing_history: bool) {
    let situation = &reflection.situation;
    println!(
        "{}",
        format!("회고 리포트 · {}", reflection.date)
            .bright_magenta()
            .bold()
    );
    println!("  {}", situation.what_happened);
    let emotions: Vec<String> = situation.emotions.iter().map(Emotion::to_string).collect();
    if !emotions.is_empty() {
        println!(
            "  {}",
            format!("{} (강도 {})", emotions.join(", "), situation.emotion_intensity).bright_black()
        );
    }

    let Some(report) = reflection.report.as_ref() else {
        println!("{}", "리포트를 생성하는 중입니다... (Enter 로 새로고침)".yellow());
        return;
    };
    println!();
    println!("{}", "요약".bold());
    println!("  {}", report.summary);
    section("핵심 인사이트", &report.key_insights);
    section("이렇게 말해보세요", &report.suggested_phrases);
    if let Some(advice) = report.counselor_advice.as_ref() {
        section("상담사의 조언", advice);
    }
    if !viewing_history {
        println!();
        info("/save 로 일기에 저장하거나 /back 으로 저장하지 않고 나갈 수 있습니다.");
    }
}

fn section(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("{}", title.bold());
    for item in items {
        println!("  - {}", item);
    }
}

pub fn diary(entries: &[Reflection], filter: EmotionFilter, refreshing: bool) {
    println!(
        "{}",
        format!("회고 일기 · {} ({}개)", filter, entries.len())
            .bright_magenta()
            .bold()
    );
    if refreshing {
        info("불러오는 중...");
    }
    if entries.is_empty() {
        info("표시할 회고가 없습니다.");
        return;
    }
    for (i, entry) in entries.iter().enumerate() {
        let emotions: Vec<String> = entry
            .situation
            .emotions
            .iter()
            .map(Emotion::to_string)
            .collect();
        println!(
            "{:>3}. {} {} {}",
            i + 1,
            entry.date.bright_black(),
            entry.situation.what_happened,
            emotions.join(" ").cyan()
        );
    }
}
