use deepchat_core::config::Settings;
use deepchat_core::context::{DEFAULT_GREETING, DEFAULT_SYSTEM_INSTRUCTION};
use deepchat_core::*;
use tempfile::TempDir;

// ========================================================================
// Settings Tests (config/mod.rs)
// ========================================================================

#[test]
fn test_settings_default_values() {
    let settings = Settings::default();

    assert_eq!(settings.llm.base_url, "http://localhost:11434");
    assert_eq!(settings.llm.model, "deepseek-r1:latest");
    assert_eq!(settings.llm.models, vec!["deepseek-r1:latest"]);
    assert!((settings.llm.temperature - 0.3).abs() < f64::EPSILON);
    assert!(settings.llm.timeout_secs.is_none());

    assert_eq!(settings.chat.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
    assert_eq!(settings.chat.greeting, DEFAULT_GREETING);
    assert!(settings.chat.custom_instructions.is_none());

    assert_eq!(settings.ui.theme, "dark");
    assert!(settings.ui.show_sidebar);
}

#[test]
fn test_settings_save_and_reload_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");

    let mut settings = Settings::default();
    settings.select_model("qwen2.5-coder:7b");
    settings.llm.base_url = "http://gpu-box:11434".into();
    settings.chat.greeting = "Hello there.".into();
    settings.ui.theme = "sky".into();
    settings.save_to(&path).unwrap();

    let loaded = Settings::load_from(&path).unwrap();
    assert_eq!(loaded.llm.model, "qwen2.5-coder:7b");
    assert_eq!(loaded.llm.models.len(), 2);
    assert_eq!(loaded.llm.base_url, "http://gpu-box:11434");
    assert_eq!(loaded.chat.greeting, "Hello there.");
    assert_eq!(loaded.ui.theme, "sky");
}

#[test]
fn test_settings_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let result = Settings::load_from(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ChatError::Io(_))));
}

#[test]
fn test_settings_build_llm_client_uses_active_model() {
    let mut settings = Settings::default();
    settings.llm.base_url = "http://127.0.0.1:9999/".into();
    settings.llm.timeout_secs = Some(30);

    let client = settings.build_llm_client();
    assert_eq!(client.model(), "deepseek-r1:latest");
    assert_eq!(client.base_url(), "http://127.0.0.1:9999");
}

#[test]
fn test_session_from_settings_uses_greeting_and_instruction() {
    let mut settings = Settings::default();
    settings.chat.greeting = "Ready when you are.".into();
    settings.chat.custom_instructions = Some("Prefer iterators.".into());

    let session = ChatSession::from_settings(&settings);
    assert_eq!(session.log().all()[0].content(), "Ready when you are.");
    assert!(session.system_instruction().ends_with("Prefer iterators."));

    let chain = session.current_chain();
    assert_eq!(chain.templates()[0].kind, TemplateKind::System);
    assert_eq!(chain.templates()[0].text, session.system_instruction());
}

// ========================================================================
// ConversationLog Tests (context/history.rs)
// ========================================================================

#[test]
fn test_conversation_log_add_turns() {
    let mut log = ConversationLog::new();

    log.append(Turn::user("Hello")).unwrap();
    log.append(Turn::assistant("Hi there!")).unwrap();
    log.append(Turn::user("How are you?")).unwrap();

    let turns = log.all();
    assert_eq!(turns.len(), 4);
    assert_eq!(turns[0].content(), DEFAULT_GREETING);
    assert_eq!(turns[1].content(), "Hello");
    assert_eq!(turns[2].content(), "Hi there!");
    assert_eq!(turns[3].content(), "How are you?");
}

#[test]
fn test_conversation_log_roles() {
    let mut log = ConversationLog::with_greeting("Hi");
    log.append(Turn::user("Hello")).unwrap();

    let roles: Vec<Role> = log.iter().map(Turn::role).collect();
    assert_eq!(roles, vec![Role::Assistant, Role::User]);
}

#[test]
fn test_conversation_log_last_turn() {
    let mut log = ConversationLog::new();
    log.append(Turn::user("First")).unwrap();
    log.append(Turn::assistant("Second")).unwrap();

    let last = log.last().unwrap();
    assert_eq!(last.role(), Role::Assistant);
    assert_eq!(last.content(), "Second");
}

#[test]
fn test_conversation_log_iterates_by_reference() {
    let log = ConversationLog::with_greeting("Hi");
    let mut count = 0;
    for turn in &log {
        assert_eq!(turn.content(), "Hi");
        count += 1;
    }
    assert_eq!(count, 1);
}

// ========================================================================
// PromptChainBuilder Tests (context/builder.rs)
// ========================================================================

#[test]
fn test_chain_messages_follow_log() {
    let mut log = ConversationLog::with_greeting("Hi");
    log.append(Turn::user("What is a closure?")).unwrap();

    let messages = PromptChainBuilder::new("sys").build(&log).to_messages();
    assert_eq!(
        messages,
        vec![
            Message::system("sys"),
            Message::assistant("Hi"),
            Message::user("What is a closure?"),
        ]
    );
}

#[test]
fn test_system_prompt_builder_with_custom_instructions() {
    let prompt = SystemPromptBuilder::new()
        .with_custom_instructions("Always explain borrow errors.")
        .build();

    assert!(prompt.contains("expert AI coding assistant"));
    assert!(prompt.contains("Always explain borrow errors."));
}
