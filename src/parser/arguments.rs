use super::QuoteState;

/// Classified argument list of an opening directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arguments<'a> {
    /// A single policy expression
    Simple { policy: &'a str },
    /// A policy expression followed by auxiliary arguments
    Complex { policy: &'a str, aux: Vec<&'a str> },
}

impl<'a> Arguments<'a> {
    /// Parse raw directive argument text.
    ///
    /// On failure returns the 0-based index of the first empty argument.
    pub fn parse(args: &'a str) -> Result<Self, usize> {
        let mut pieces = split_top_level(args);

        if let Some(index) = pieces.iter().position(|piece| piece.is_empty()) {
            return Err(index);
        }

        let policy = pieces.remove(0);
        if pieces.is_empty() {
            Ok(Arguments::Simple { policy })
        } else {
            Ok(Arguments::Complex { policy, aux: pieces })
        }
    }

    /// The policy expression
    pub fn policy(&self) -> &'a str {
        match self {
            Arguments::Simple { policy } | Arguments::Complex { policy, .. } => policy,
        }
    }

    /// Auxiliary arguments, empty for the simple form
    pub fn aux(&self) -> &[&'a str] {
        match self {
            Arguments::Simple { .. } => &[],
            Arguments::Complex { aux, .. } => aux,
        }
    }
}

/// Split on commas that sit outside brackets and string literals, trimming each piece.
/// Always yields at least one piece.
pub fn split_top_level(args: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut quotes = QuoteState::default();
    let mut depth = 0usize;
    let mut start = 0;

    for (offset, ch) in args.char_indices() {
        if quotes.feed(ch) {
            continue;
        }
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push(args[start..offset].trim());
                start = offset + 1;
            }
            _ => {}
        }
    }
    pieces.push(args[start..].trim());

    pieces
}
