use crate::command::{Command, PostPayload, GET_BOARD, POST, QUIT};
use crate::delimiters::Delimiters;
use crate::error::ParseError;

/// Cut `raw` at the first terminator, if any.
///
/// Keeps bytes of a following message out of the current parse.
pub fn bounded<'a>(raw: &'a str, terminator: &str) -> &'a str {
    match raw.find(terminator) {
        Some(end) => &raw[..end],
        None => raw,
    }
}

/// Split a bounded body into tokens.
///
/// Phase one splits on the message separator into payload groups, phase two
/// splits each group on the field delimiter. The result is flattened, so a
/// separator behaves exactly like a field delimiter: `A}#{B` and `A}+{B`
/// tokenize the same way.
pub fn tokenize<'a>(raw: &'a str, delims: &Delimiters) -> Vec<&'a str> {
    bounded(raw, delims.terminator())
        .split(delims.separator())
        .flat_map(|group| group.split(delims.field()))
        .collect()
}

/// Parse one frame body into a [`Command`].
///
/// Never fails outright: malformed input becomes [`Command::Invalid`]
/// carrying the reason.
pub fn parse(raw: &str, delims: &Delimiters) -> Command {
    if bounded(raw, delims.terminator()).is_empty() {
        return Command::Invalid(ParseError::Empty);
    }

    let tokens = tokenize(raw, delims);
    let Some((word, args)) = tokens.split_first() else {
        return Command::Invalid(ParseError::Empty);
    };

    match *word {
        GET_BOARD => Command::GetBoard {
            author_filter: args.first().copied().unwrap_or_default().to_string(),
            title_filter: args.get(1).copied().unwrap_or_default().to_string(),
        },
        POST => match parse_posts(args) {
            Ok(posts) => Command::Post { posts },
            Err(err) => Command::Invalid(err),
        },
        QUIT => Command::Quit,
        other => Command::Invalid(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Parse a raw frame as received from the transport.
pub fn parse_bytes(raw: &[u8], delims: &Delimiters) -> Command {
    match std::str::from_utf8(raw) {
        Ok(text) => parse(text, delims),
        Err(_) => Command::Invalid(ParseError::NotUtf8),
    }
}

/// Validate a POST argument list; all triples or nothing.
fn parse_posts(args: &[&str]) -> Result<Vec<PostPayload>, ParseError> {
    if args.is_empty() {
        return Err(ParseError::NoPosts);
    }
    let posts = triples(args).ok_or(ParseError::RequiresTriples)?;
    if posts.iter().any(|post| post.message.is_empty()) {
        return Err(ParseError::EmptyMessage);
    }
    Ok(posts)
}

/// Group fields into `author, title, message` triples.
///
/// Returns `None` when the count is not a multiple of three.
pub(crate) fn triples(fields: &[&str]) -> Option<Vec<PostPayload>> {
    if fields.len() % 3 != 0 {
        return None;
    }
    Some(
        fields
            .chunks_exact(3)
            .map(|triple| PostPayload::new(triple[0], triple[1], triple[2]))
            .collect(),
    )
}
