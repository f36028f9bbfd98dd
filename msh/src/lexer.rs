//! Whitespace tokenizer with quote grouping.

/// A word of the input line with the byte range it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Splits a line on whitespace. Single or double quotes group characters,
/// whitespace included, into one word; the quote characters themselves are
/// dropped. `''` yields an empty word. A quote that is never closed is an
/// ordinary character, so `don't` stays one word.
#[must_use]
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut literal_quotes = Vec::new();
    loop {
        match scan(line, &literal_quotes) {
            Ok(tokens) => return tokens,
            Err(open_at) => literal_quotes.push(open_at),
        }
    }
}

/// One pass over `line`. Quotes at the byte offsets in `literal_quotes` are
/// plain text. Fails with the offset of the first quote left open.
fn scan(line: &str, literal_quotes: &[usize]) -> Result<Vec<Token>, usize> {
    let mut tokens = Vec::new();
    let mut current: Option<Token> = None;
    let mut quote: Option<(char, usize)> = None;

    for (idx, ch) in line.char_indices() {
        match quote {
            Some((q, _)) if ch == q => quote = None,
            Some(_) => push_char(&mut current, idx, ch),
            None if (ch == '\'' || ch == '"') && !literal_quotes.contains(&idx) => {
                quote = Some((ch, idx));
                current.get_or_insert_with(|| Token {
                    text: String::new(),
                    start: idx,
                    end: idx,
                });
            }
            None if ch.is_whitespace() => {
                if let Some(token) = current.take() {
                    tokens.push(token);
                }
                continue;
            }
            None => push_char(&mut current, idx, ch),
        }
        if let Some(token) = current.as_mut() {
            token.end = idx + ch.len_utf8();
        }
    }

    if let Some((_, open_at)) = quote {
        return Err(open_at);
    }
    if let Some(token) = current {
        tokens.push(token);
    }
    Ok(tokens)
}

fn push_char(current: &mut Option<Token>, idx: usize, ch: char) {
    current
        .get_or_insert_with(|| Token {
            text: String::new(),
            start: idx,
            end: idx,
        })
        .text
        .push(ch);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<String> {
        tokenize(line).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(words("  ls   -l\t/data "), vec!["ls", "-l", "/data"]);
        assert!(words("   ").is_empty());
    }

    #[test]
    fn quotes_group_and_are_removed() {
        assert_eq!(
            words("echo 'hello world' \"a b\"c"),
            vec!["echo", "hello world", "a bc"]
        );
        assert_eq!(words("alias ll='ls -l'"), vec!["alias", "ll=ls -l"]);
        assert_eq!(words("echo \"it's\""), vec!["echo", "it's"]);
        assert_eq!(words("echo ''"), vec!["echo", ""]);
    }

    #[test]
    fn spans_cover_the_source_text() {
        let line = "ll  'a b' c";
        let tokens = tokenize(line);
        assert_eq!(&line[tokens[0].start..tokens[0].end], "ll");
        assert_eq!(&line[tokens[1].start..tokens[1].end], "'a b'");
        assert_eq!(&line[tokens[2].start..tokens[2].end], "c");
    }

    #[test]
    fn unmatched_quote_is_literal() {
        assert_eq!(words("echo don't panic"), vec!["echo", "don't", "panic"]);
        assert_eq!(words("echo 'oops"), vec!["echo", "'oops"]);
        assert_eq!(
            words("say \"it's\" 'fine"),
            vec!["say", "it's", "'fine"]
        );
    }

    #[test]
    fn unmatched_quote_span_covers_the_word() {
        let line = "cat it's";
        let tokens = tokenize(line);
        assert_eq!(&line[tokens[1].start..tokens[1].end], "it's");
    }
}
