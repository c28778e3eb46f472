//! Diffs between the old and new value of a changed field.
//!
//! Text is compared word by word (whitespace runs are tokens of their own, so
//! formatting changes show up too). Numbers are shown as signed difference.
//! Other value kinds have no meaningful diff.

use serde_json::Value;

/// Token products above this size are not diffed token by token
const MAX_DIFF_CELLS: usize = 250_000;

/// One run of a text diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp {
    Equal(String),
    Delete(String),
    Insert(String),
}

/// A formatted diff between two field values
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedDiff {
    Text { ops: Vec<DiffOp> },
    Numeric { difference: f64 },
}

impl FormattedDiff {
    /// Renders the diff as HTML with `<del>`/`<ins>` markup.
    #[must_use]
    pub fn to_html(&self) -> String {
        match self {
            Self::Text { ops } => ops
                .iter()
                .map(|op| match op {
                    DiffOp::Equal(text) => escape_html(text),
                    DiffOp::Delete(text) => format!("<del>{}</del>", escape_html(text)),
                    DiffOp::Insert(text) => format!("<ins>{}</ins>", escape_html(text)),
                })
                .collect(),
            Self::Numeric { .. } => format!("<span class=\"text-muted\">{}</span>", self.to_plain()),
        }
    }

    /// Renders the diff as plain text using `[-deleted-]` and `{+inserted+}`.
    #[must_use]
    pub fn to_plain(&self) -> String {
        match self {
            Self::Text { ops } => ops
                .iter()
                .map(|op| match op {
                    DiffOp::Equal(text) => text.clone(),
                    DiffOp::Delete(text) => format!("[-{text}-]"),
                    DiffOp::Insert(text) => format!("{{+{text}+}}"),
                })
                .collect(),
            Self::Numeric { difference } if *difference > 0.0 => format!("(+{difference})"),
            Self::Numeric { difference } => format!("({difference})"),
        }
    }
}

/// Formats the difference between two values, None if they can not be diffed.
#[must_use]
pub fn format_diff(old: &Value, new: &Value) -> Option<FormattedDiff> {
    match (old, new) {
        (Value::String(old), Value::String(new)) => Some(FormattedDiff::Text {
            ops: diff_words(old, new),
        }),
        (Value::Number(old), Value::Number(new)) => {
            let difference = new.as_f64()? - old.as_f64()?;
            Some(FormattedDiff::Numeric { difference })
        }
        _ => None,
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (index, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|s| s != space) {
            tokens.push(&text[start..index]);
            start = index;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn push_op(ops: &mut Vec<DiffOp>, op: DiffOp) {
    match (ops.last_mut(), op) {
        (Some(DiffOp::Equal(last)), DiffOp::Equal(text))
        | (Some(DiffOp::Delete(last)), DiffOp::Delete(text))
        | (Some(DiffOp::Insert(last)), DiffOp::Insert(text)) => last.push_str(&text),
        (_, op) => ops.push(op),
    }
}

/// Computes a word level diff using the longest common subsequence of tokens.
#[must_use]
pub fn diff_words(old: &str, new: &str) -> Vec<DiffOp> {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);
    let mut ops = Vec::new();

    // Common prefix and suffix are cheap to strip and keep the table small
    let prefix = old_tokens
        .iter()
        .zip(&new_tokens)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_tokens[prefix..]
        .iter()
        .rev()
        .zip(new_tokens[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old_tokens[prefix..old_tokens.len() - suffix];
    let new_mid = &new_tokens[prefix..new_tokens.len() - suffix];

    if prefix > 0 {
        push_op(&mut ops, DiffOp::Equal(old_tokens[..prefix].concat()));
    }

    if old_mid.len().saturating_mul(new_mid.len()) > MAX_DIFF_CELLS {
        if !old_mid.is_empty() {
            push_op(&mut ops, DiffOp::Delete(old_mid.concat()));
        }
        if !new_mid.is_empty() {
            push_op(&mut ops, DiffOp::Insert(new_mid.concat()));
        }
    } else {
        lcs_ops(old_mid, new_mid, &mut ops);
    }

    if suffix > 0 {
        push_op(
            &mut ops,
            DiffOp::Equal(old_tokens[old_tokens.len() - suffix..].concat()),
        );
    }

    ops
}

fn lcs_ops(old: &[&str], new: &[&str], ops: &mut Vec<DiffOp>) {
    let (n, m) = (old.len(), new.len());
    // lengths[i][j] = LCS length of old[i..] and new[j..]
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if old[i] == new[j] {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            push_op(ops, DiffOp::Equal(old[i].to_string()));
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            push_op(ops, DiffOp::Delete(old[i].to_string()));
            i += 1;
        } else {
            push_op(ops, DiffOp::Insert(new[j].to_string()));
            j += 1;
        }
    }
    for token in &old[i..] {
        push_op(ops, DiffOp::Delete((*token).to_string()));
    }
    for token in &new[j..] {
        push_op(ops, DiffOp::Insert((*token).to_string()));
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
