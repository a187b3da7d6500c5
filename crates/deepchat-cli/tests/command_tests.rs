use deepchat_cli::commands::{complete_command, handle_command, CommandResult};
use deepchat_cli::Theme;

// ========================================================================
// Command Parsing Tests (commands.rs)
// ========================================================================

#[test]
fn test_help_command() {
    let result = handle_command("/help");
    let CommandResult::Message(msg) = result else {
        panic!("expected help text");
    };
    assert!(msg.contains("DeepChat Commands"));
    assert!(msg.contains("/model <name>"));
}

#[test]
fn test_help_command_short_alias() {
    assert!(matches!(handle_command("/h"), CommandResult::Message(_)));
}

#[test]
fn test_quit_aliases() {
    for cmd in ["/exit", "/quit", "/q"] {
        assert_eq!(handle_command(cmd), CommandResult::Quit, "{cmd}");
    }
}

#[test]
fn test_clear_and_new_are_distinct() {
    assert_eq!(handle_command("/clear"), CommandResult::Clear);
    assert_eq!(handle_command("/new"), CommandResult::NewConversation);
}

#[test]
fn test_model_without_argument_lists_models() {
    assert_eq!(handle_command("/model"), CommandResult::ShowModels);
    assert_eq!(handle_command("/model   "), CommandResult::ShowModels);
}

#[test]
fn test_model_with_argument() {
    assert_eq!(
        handle_command("/model deepseek-r1:14b"),
        CommandResult::ModelChanged("deepseek-r1:14b".into())
    );
}

#[test]
fn test_models_asks_server() {
    assert_eq!(handle_command("/models"), CommandResult::DiscoverModels);
}

#[test]
fn test_theme_without_argument_lists_themes() {
    let CommandResult::Message(msg) = handle_command("/theme") else {
        panic!("expected theme list");
    };
    for name in Theme::all_names() {
        assert!(msg.contains(name));
    }
}

#[test]
fn test_theme_with_argument() {
    assert_eq!(
        handle_command("/theme sky"),
        CommandResult::ThemeChanged("sky".into())
    );
}

#[test]
fn test_display_and_info_commands() {
    assert_eq!(handle_command("/sidebar"), CommandResult::ToggleSidebar);
    assert_eq!(handle_command("/status"), CommandResult::ShowStatus);
    assert_eq!(handle_command("/system"), CommandResult::ShowSystemPrompt);
    assert_eq!(handle_command("/save"), CommandResult::SaveSettings);
}

#[test]
fn test_version_command() {
    let CommandResult::Message(msg) = handle_command("/version") else {
        panic!("expected version");
    };
    assert!(msg.starts_with("DeepChat v"));
}

#[test]
fn test_unknown_command() {
    let CommandResult::Message(msg) = handle_command("/frobnicate") else {
        panic!("expected error message");
    };
    assert!(msg.contains("Unknown command: /frobnicate"));
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(
        handle_command("What is a closure?"),
        CommandResult::NotACommand
    );
}

// ========================================================================
// Completion
// ========================================================================

#[test]
fn test_complete_unique_prefix() {
    assert_eq!(complete_command("/sid"), Some("/sidebar".into()));
    assert_eq!(complete_command("/ver"), Some("/version".into()));
}

#[test]
fn test_complete_ambiguous_prefix() {
    // /model and /models
    assert_eq!(complete_command("/mod"), None);
    assert_eq!(complete_command("/s"), None);
}

#[test]
fn test_complete_ignores_plain_text_and_arguments() {
    assert_eq!(complete_command("hello"), None);
    assert_eq!(complete_command("/theme sk"), None);
}

#[test]
fn test_theme_find_rejects_unknown_names() {
    assert!(Theme::find("solarized").is_none());
    for name in Theme::all_names() {
        assert_eq!(Theme::find(name).map(|t| t.name), Some(*name));
    }
}

#[test]
fn test_theme_fallback() {
    assert_eq!(Theme::by_name("no-such-theme").name, "dark");
    assert_eq!(Theme::by_name("dracula").name, "dracula");
}
