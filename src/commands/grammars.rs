use anyhow::Result;
use wiktminer::grammar::{builtin_grammar, builtin_names};

pub fn list_grammars() -> Result<()> {
    println!("{:<6} {:<16} {:<10} Pronunciation block", "Code", "Site", "Target");
    for code in builtin_names() {
        let grammar = builtin_grammar(code)?;
        println!(
            "{:<6} {:<16} {:<10} {}",
            code,
            format!("{}{}", code, grammar.mw_type()),
            grammar.target(),
            grammar
                .pronunciation_regex()
                .map(|re| re.as_str().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
    }
    Ok(())
}
