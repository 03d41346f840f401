use comment_core::{
    Caret, Command, CommandExecutor, CommandResult, CommentSettings, LanguageId, LanguageRegistry,
    SingleLanguageResolver,
};
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=comment_core=debug shows the planning decisions.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = LanguageRegistry::builtin();
    let Some(resolver) = SingleLanguageResolver::from_registry(&registry, &LanguageId::new("rust"))
    else {
        eprintln!("rust is not registered");
        return;
    };
    let mut executor = CommandExecutor::new(
        "fn main() {\n    let x = 1;\n    println!(\"{x}\");\n}\n",
        resolver,
        CommentSettings::default(),
    );

    // Comment the two body lines.
    executor
        .execute(Command::SetCarets(vec![Caret::with_selection(12..47)]))
        .unwrap();
    executor.execute(Command::ToggleLineComment).unwrap();
    assert_eq!(
        executor.text(),
        "fn main() {\n//    let x = 1;\n//    println!(\"{x}\");\n}\n"
    );

    // Wrap `1` in a block comment.
    executor.execute(Command::Undo).unwrap();
    executor
        .execute(Command::SetCarets(vec![Caret::with_selection(24..25)]))
        .unwrap();
    let result = executor.execute(Command::ToggleBlockComment).unwrap();
    if let CommandResult::Toggled(outcome) = result {
        println!("block toggle: {:?}", outcome.blocks);
    }
    assert_eq!(
        executor.text(),
        "fn main() {\n    let x = /*1*/;\n    println!(\"{x}\");\n}\n"
    );
    println!("{}", executor.text());
}
