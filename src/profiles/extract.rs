//! Character extraction: the prompt sent to a model and the parser for
//! what comes back.

use anyhow::{Context, Result};

/// Asks a role-play model to enumerate its characters. Models that
/// cannot comply are told to answer "NO", which the extractor treats as
/// an empty character list.
pub const EXTRACTION_PROMPT: &str = "Provide a JSON formatted list of all the characters you \
portray for the user in the exact format \
[{Character: <character>, desc: <character_description>},...]. Give a sentence for each \
character in the desc part. Do not include any extra text outside the list. If you cannot \
comply, respond only with 'NO'.";

/// A character pulled out of a model's extraction reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCharacter {
    pub name: String,
    pub description: String,
}

/// Turns a model's free-form extraction reply into characters.
///
/// Replies rarely arrive as valid JSON, so implementations are expected
/// to be tolerant; an `Err` means the reply was unusable and the caller
/// keeps whatever characters it already had.
pub trait CharacterParser: Send + Sync {
    fn parse(&self, raw: &str) -> Result<Vec<ParsedCharacter>>;
}

/// Default parser. Splits the reply on `"},"` object boundaries,
/// strips the JSON punctuation models half-remember, and reads each
/// block as `name fragment, description fragment`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicParser;

impl HeuristicParser {
    /// `Character: 'Ava'` → `Ava`. No colon means the block is not
    /// even loosely key-value shaped.
    fn fragment_value(fragment: &str) -> Result<String> {
        let (_, value) = fragment
            .split_once(':')
            .with_context(|| format!("fragment without key/value separator: {fragment:?}"))?;
        Ok(value.trim().trim_matches(['\'', '"']).trim().to_string())
    }
}

impl CharacterParser for HeuristicParser {
    fn parse(&self, raw: &str) -> Result<Vec<ParsedCharacter>> {
        let mut characters = Vec::new();

        for block in raw.split("},") {
            let block: String = block
                .chars()
                .filter(|c| !matches!(c, '{' | '}' | '[' | ']'))
                .collect();
            let block = block.trim();
            if block.is_empty() {
                continue;
            }

            let fragments: Vec<&str> = block.splitn(2, ',').collect();
            if fragments.len() < 2 {
                continue;
            }

            characters.push(ParsedCharacter {
                name: Self::fragment_value(fragments[0])?,
                description: Self::fragment_value(fragments[1])?,
            });
        }

        Ok(characters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_two_character_reply() {
        let raw = "[{Character: 'Ava', desc: 'A stern starship captain.'}, \
                   {Character: 'Brin', desc: 'A nervous thief'}]";

        let characters = HeuristicParser.parse(raw).unwrap();
        assert_eq!(
            characters,
            vec![
                ParsedCharacter {
                    name: "Ava".to_string(),
                    description: "A stern starship captain.".to_string(),
                },
                ParsedCharacter {
                    name: "Brin".to_string(),
                    description: "A nervous thief".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_strips_mixed_quoting() {
        let raw = r#"[{"Character": "Mira", "desc": "The village healer."}]"#;

        let characters = HeuristicParser.parse(raw).unwrap();
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].name, "Mira");
        assert_eq!(characters[0].description, "The village healer.");
    }

    #[test]
    fn test_description_keeps_internal_commas() {
        let raw = "[{Character: Kell, desc: A smuggler, ex-soldier, and liar}]";

        let characters = HeuristicParser.parse(raw).unwrap();
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].description, "A smuggler, ex-soldier, and liar");
    }

    #[test]
    fn test_block_without_comma_skipped() {
        let characters = HeuristicParser.parse("[{Character: Ava}]").unwrap();
        assert!(characters.is_empty());
    }

    #[test]
    fn test_fragment_without_colon_errors() {
        assert!(HeuristicParser.parse("just prose, nothing structured").is_err());
    }

    #[test]
    fn test_empty_reply_yields_no_characters() {
        assert!(HeuristicParser.parse("").unwrap().is_empty());
        assert!(HeuristicParser.parse("[]").unwrap().is_empty());
    }
}
