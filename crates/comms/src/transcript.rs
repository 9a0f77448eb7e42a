use std::collections::HashMap;

use crosstrace_normalize::{clean_identifier, scrub_marks};
use crosstrace_protocol::{
    ConversationEntry, ConversationPeer, ConversationTurn, Device, DeviceId, Direction,
    MessageRow, PeerKind,
};
use once_cell::sync::Lazy;
use regex::Regex;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::PrimitiveDateTime;

use crate::error::Result;
use crate::filter::{row_matches, ConversationQuery};
use crate::policy::{side_of, ResolverPolicy};

/// Wall-clock fragment inside a free-text timestamp. Seconds are consumed
/// when present so the boundary check cannot cut a match short.
static CLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)(?::[0-5]\d)?\b").expect("clock pattern")
});

/// Trailing `(UTC+7)` style tags some tools append to timestamps.
static UTC_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(UTC[+-]\d+\)").expect("utc tag pattern"));

/// Timestamp formats seen across extraction exports, most common first.
const KNOWN_FORMATS: &[&[FormatItem<'static>]] = &[
    format_description!("[day]/[month]/[year] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[day]/[month]/[year] [hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

/// Clean exported message text for display.
///
/// Literal `\n`/`\r`/`\t` escape sequences (and their doubled forms)
/// become spaces, zero-width marks are dropped, whitespace runs collapse,
/// and a single trailing unescaped backslash left by a truncated export
/// is removed. Infallible; garbage in, shorter garbage out.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let unescaped = raw
        .replace("\\\\n", " ")
        .replace("\\\\r", " ")
        .replace("\\\\t", " ")
        .replace("\\n", " ")
        .replace("\\r", " ")
        .replace("\\t", " ");
    let mut text = scrub_marks(&unescaped);
    if text.ends_with('\\') && !text.ends_with("\\\\") {
        text.pop();
    }
    text.trim_end().to_string()
}

/// Pull an `HH:MM` display time out of a free-text timestamp.
///
/// A clock fragment anywhere in the text wins; otherwise the full value
/// is parsed against [`KNOWN_FORMATS`]. Unparsable input yields an empty
/// string, never an error.
#[must_use]
pub fn extract_display_time(raw: &str) -> String {
    let cleaned = scrub_marks(raw);
    if let Some(caps) = CLOCK.captures(&cleaned) {
        let hour = &caps[1];
        let minute = &caps[2];
        return if hour.len() == 1 {
            format!("0{hour}:{minute}")
        } else {
            format!("{hour}:{minute}")
        };
    }
    match parse_timestamp(&cleaned) {
        Some(stamp) => format!("{:02}:{:02}", stamp.hour(), stamp.minute()),
        None => String::new(),
    }
}

/// Parse a raw timestamp against the known export formats, after peeling
/// off a trailing UTC-offset tag.
pub(crate) fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    let cleaned = scrub_marks(raw);
    if cleaned.is_empty() {
        return None;
    }
    let cleaned = UTC_TAG.replace(&cleaned, "");
    let cleaned = cleaned.trim();
    KNOWN_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(cleaned, *format).ok())
}

/// Assemble filtered messages into per-conversation transcripts.
///
/// Messages are grouped by `chat_id`, falling back to `thread_id`; rows
/// carrying neither are dropped with a warning. When the query names a
/// person the result reads top to bottom (oldest first); a browse query
/// puts the most recent traffic first. Rows whose timestamps fail to
/// parse keep their input order relative to each other.
pub fn assemble(
    messages: &[MessageRow],
    devices: &[Device],
    query: &ConversationQuery,
) -> Result<Vec<ConversationEntry>> {
    query.validate()?;
    let owners: HashMap<DeviceId, String> = devices
        .iter()
        .map(|d| (d.id, clean_identifier(&d.owner_name)))
        .collect();
    let policy = ResolverPolicy::default();

    let mut drafts: Vec<(String, Vec<&MessageRow>)> = Vec::new();
    let mut draft_index: HashMap<String, usize> = HashMap::new();
    let mut orphans = 0usize;
    for msg in messages.iter().filter(|m| row_matches(query, m)) {
        let mut conversation = clean_identifier(&msg.chat_id);
        if conversation.is_empty() {
            conversation = clean_identifier(&msg.thread_id);
        }
        if conversation.is_empty() {
            orphans += 1;
            continue;
        }
        let at = match draft_index.get(&conversation) {
            Some(&at) => at,
            None => {
                drafts.push((conversation.clone(), Vec::new()));
                draft_index.insert(conversation, drafts.len() - 1);
                drafts.len() - 1
            }
        };
        drafts[at].1.push(msg);
    }
    if orphans > 0 {
        log::warn!("conversation assembly dropped {orphans} rows without a chat or thread id");
    }

    let ascending = query.person.as_deref().is_some_and(|p| !p.trim().is_empty());
    let mut keyed: Vec<(Option<PrimitiveDateTime>, ConversationEntry)> = drafts
        .into_iter()
        .map(|(conversation_id, rows)| {
            let peer = classify(&rows, &owners, &policy);
            let mut turns: Vec<(Option<PrimitiveDateTime>, ConversationTurn)> = rows
                .iter()
                .map(|msg| (parse_timestamp(&msg.timestamp), turn_of(msg)))
                .collect();
            if ascending {
                turns.sort_by(|a, b| a.0.cmp(&b.0));
            } else {
                turns.sort_by(|a, b| b.0.cmp(&a.0));
            }
            let entry_key = turns.first().and_then(|(stamp, _)| *stamp);
            let entry = ConversationEntry {
                conversation_id,
                peer,
                turns: turns.into_iter().map(|(_, turn)| turn).collect(),
            };
            (entry_key, entry)
        })
        .collect();
    if ascending {
        keyed.sort_by(|a, b| a.0.cmp(&b.0));
    } else {
        keyed.sort_by(|a, b| b.0.cmp(&a.0));
    }
    Ok(keyed.into_iter().map(|(_, entry)| entry).collect())
}

/// Direct transcript of one thread (or chat), oldest first.
///
/// Works on raw rows, so messages whose peer could not be resolved are
/// still reachable here.
#[must_use]
pub fn thread_transcript(messages: &[MessageRow], thread_id: &str) -> Vec<ConversationTurn> {
    let wanted = clean_identifier(thread_id);
    if wanted.is_empty() {
        return Vec::new();
    }
    let mut turns: Vec<(Option<PrimitiveDateTime>, ConversationTurn)> = messages
        .iter()
        .filter(|m| {
            clean_identifier(&m.thread_id) == wanted || clean_identifier(&m.chat_id) == wanted
        })
        .map(|m| (parse_timestamp(&m.timestamp), turn_of(m)))
        .collect();
    turns.sort_by(|a, b| a.0.cmp(&b.0));
    turns.into_iter().map(|(_, turn)| turn).collect()
}

/// Label a conversation: the first row carrying group metadata decides,
/// otherwise the first non-owner side does.
fn classify(
    rows: &[&MessageRow],
    owners: &HashMap<DeviceId, String>,
    policy: &ResolverPolicy,
) -> ConversationPeer {
    for msg in rows {
        let name = clean_identifier(&msg.group_name);
        let id = clean_identifier(&msg.group_id);
        if !name.is_empty() || !id.is_empty() {
            return ConversationPeer {
                kind: PeerKind::Group,
                name: if name.is_empty() { id.clone() } else { name },
                id,
            };
        }
    }
    for msg in rows {
        let owner = owners.get(&msg.device_id).map(String::as_str).unwrap_or("");
        let sender = side_of(&msg.sender_name, &msg.sender_id);
        let recipient = side_of(&msg.recipient_name, &msg.recipient_id);
        let (preferred, other) = match Direction::from_raw(&msg.direction) {
            Direction::Outgoing => (recipient, sender),
            Direction::Incoming | Direction::Unknown => (sender, recipient),
        };
        for side in [preferred, other] {
            if let Some((name, id)) = policy.person_from(&side) {
                if !policy.matches_owner(&name, owner) {
                    return ConversationPeer { kind: PeerKind::Person, name, id };
                }
            }
        }
    }
    ConversationPeer { kind: PeerKind::Person, name: String::new(), id: String::new() }
}

fn turn_of(msg: &MessageRow) -> ConversationTurn {
    let side = side_of(&msg.sender_name, &msg.sender_id);
    ConversationTurn {
        message_id: msg.message_id,
        sender: side.name,
        sender_id: side.id,
        direction: Direction::from_raw(&msg.direction),
        text: clean_text(&msg.text),
        time: extract_display_time(&msg.timestamp),
    }
}
