//! Tokenizing a mode string against its parameters.

use std::sync::Arc;

use super::change::ModeChange;
use super::descriptor::ModeDescriptor;
use crate::error::ModeError;

/// One tokenized item. `desc` is `None` for letters unknown to the target.
#[derive(Debug, Clone)]
pub struct ParsedItem {
    pub change: ModeChange,
    pub desc: Option<Arc<ModeDescriptor>>,
}

/// Walk `modestr` and `params` in lockstep.
///
/// A leading `+`/`-` sets direction and may flip mid-string; no sign means
/// adding. Unknown letters consume nothing and are returned with no
/// descriptor. A missing parameter or leftover parameters fail the whole
/// request.
pub fn parse_request<F>(modestr: &str, params: &[String], lookup: F) -> Result<Vec<ParsedItem>, ModeError>
where
    F: Fn(char) -> Option<Arc<ModeDescriptor>>,
{
    let mut adding = true;
    let mut args = params.iter();
    let mut items = Vec::new();

    for c in modestr.chars() {
        match c {
            '+' => adding = true,
            '-' => adding = false,
            letter => {
                let desc = lookup(letter);
                let param = match &desc {
                    Some(d) if d.takes_param(adding) => match args.next() {
                        Some(p) => Some(p.clone()),
                        None => {
                            let sign = if adding { '+' } else { '-' };
                            return Err(ModeError::MalformedRequest(format!(
                                "missing parameter for {sign}{letter}"
                            )));
                        }
                    },
                    _ => None,
                };
                items.push(ParsedItem {
                    change: ModeChange {
                        letter,
                        adding,
                        param,
                    },
                    desc,
                });
            }
        }
    }

    if items.is_empty() {
        return Err(ModeError::MalformedRequest("no mode letters".into()));
    }
    let unused = args.count();
    if unused > 0 {
        return Err(ModeError::MalformedRequest(format!("{unused} unused parameter(s)")));
    }
    Ok(items)
}

/// A request made only of list letters and no parameters asks to see the
/// lists rather than change them. Returns the letters to show.
pub fn list_query<F>(modestr: &str, params: &[String], lookup: F) -> Option<Vec<char>>
where
    F: Fn(char) -> Option<Arc<ModeDescriptor>>,
{
    if !params.is_empty() {
        return None;
    }
    let letters: Vec<char> = modestr.chars().filter(|c| *c != '+' && *c != '-').collect();
    if letters.is_empty() {
        return None;
    }
    letters
        .iter()
        .all(|l| lookup(*l).is_some_and(|d| d.is_list()))
        .then_some(letters)
}
