use std::collections::HashMap;

use crosstrace_normalize::{canonical_platform, clean_identifier, same_platform};
use crosstrace_protocol::{
    ChatKind, Device, DeviceId, Direction, MessageRow, PeerIntensity, PeerKind,
};
use serde::Serialize;

use crate::policy::{side_of, ResolverPolicy, Side};

/// A resolved counterparty, before aggregation.
#[derive(Debug, Clone)]
struct Peer {
    kind: PeerKind,
    name: String,
    id: String,
}

/// Bucket key for a peer. Buckets are keyed by the folded display name so
/// that the same person reported with different casing lands in one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PeerKey {
    kind: PeerKind,
    token: String,
}

impl PeerKey {
    fn of(peer: &Peer) -> Self {
        let token = if peer.name.is_empty() {
            peer.id.clone()
        } else {
            peer.name.to_lowercase()
        };
        Self { kind: peer.kind, token }
    }
}

/// Outcome of picking a person from one message's two sides.
enum Candidate {
    Resolved(Peer),

    /// Both sides matched the device owner; hard stop.
    OwnerBothSides,

    /// Neither side yielded a usable name or id; thread-level fallbacks
    /// may still apply.
    Unusable,
}

/// Per-conversation tally for one peer slot.
#[derive(Debug)]
struct PeerStat {
    slot: usize,
    count: usize,
    outgoing: usize,
    incoming: usize,
}

/// Peer intensities for one `(device, platform)` scan.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPeers {
    /// Aggregated peers, sorted by intensity descending.
    pub peers: Vec<PeerIntensity>,

    /// Messages belonging to this device and platform.
    pub scanned: usize,

    /// Messages attributed to a peer.
    pub resolved: usize,

    /// Messages skipped: service announcements and rows where no side
    /// yielded a usable counterparty.
    pub unresolved: usize,
}

/// Resolves the counterparty of every message for one device on one
/// platform.
///
/// Extraction exports rarely say outright who a message was exchanged
/// with. The resolver reconstructs it from whatever the row carries:
/// group metadata announced earlier in the same thread, the chat type,
/// the direction, and finally what earlier messages in the thread already
/// established. All state is local to one [`resolve`](Self::resolve)
/// call.
pub struct ThreadPeerResolver {
    device_id: DeviceId,
    owner_name: String,
    platform: String,
    policy: ResolverPolicy,
}

impl ThreadPeerResolver {
    pub fn new(device: &Device, platform: &str) -> Self {
        Self {
            device_id: device.id,
            owner_name: clean_identifier(&device.owner_name),
            platform: canonical_platform(platform),
            policy: ResolverPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: ResolverPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resolve every in-scope message to a peer and aggregate intensities.
    ///
    /// Two passes: the first records each thread's group identity (first
    /// writer wins, later rows never overwrite it), the second walks the
    /// priority ladder per message. Messages for other devices or
    /// platforms are ignored. Never fails; unusable rows are counted and
    /// dropped.
    pub fn resolve(&self, messages: &[MessageRow]) -> ResolvedPeers {
        let in_scope: Vec<&MessageRow> = messages
            .iter()
            .filter(|m| m.device_id == self.device_id && same_platform(&m.platform, &self.platform))
            .collect();
        if in_scope.len() < messages.len() {
            log::debug!(
                "peer resolution: {} of {} messages outside device {} / {}",
                messages.len() - in_scope.len(),
                messages.len(),
                self.device_id,
                self.platform
            );
        }

        let thread_groups = self.discover_groups(&in_scope);

        let mut thread_persons: HashMap<String, Peer> = HashMap::new();
        let mut slots: Vec<Peer> = Vec::new();
        let mut slot_index: HashMap<PeerKey, usize> = HashMap::new();
        let mut conversations: Vec<Vec<PeerStat>> = Vec::new();
        let mut conversation_index: HashMap<String, usize> = HashMap::new();
        let mut resolved = 0usize;

        for msg in &in_scope {
            if self.policy.skip_system_messages && self.policy.is_system_message(msg) {
                continue;
            }
            let thread = clean_identifier(&msg.thread_id);
            let Some(peer) = self.resolve_message(msg, &thread, &thread_groups, &thread_persons)
            else {
                continue;
            };
            if peer.kind == PeerKind::Person && !thread.is_empty() {
                thread_persons.entry(thread.clone()).or_insert_with(|| peer.clone());
            }

            let key = PeerKey::of(&peer);
            let slot = match slot_index.get(&key) {
                Some(&slot) => {
                    if slots[slot].id.is_empty() && !peer.id.is_empty() {
                        slots[slot].id = peer.id.clone();
                    }
                    slot
                }
                None => {
                    slots.push(peer);
                    slot_index.insert(key, slots.len() - 1);
                    slots.len() - 1
                }
            };

            let scope = if thread.is_empty() {
                clean_identifier(&msg.chat_id)
            } else {
                thread
            };
            let at = match conversation_index.get(&scope) {
                Some(&at) => at,
                None => {
                    conversations.push(Vec::new());
                    conversation_index.insert(scope, conversations.len() - 1);
                    conversations.len() - 1
                }
            };
            tally(&mut conversations[at], slot, Direction::from_raw(&msg.direction));
            resolved += 1;
        }

        let peers = self.aggregate(&slots, &conversations);
        log::debug!(
            "peer resolution: device {} / {}: {} peers from {} resolved of {} messages",
            self.device_id,
            self.platform,
            peers.len(),
            resolved,
            in_scope.len()
        );
        ResolvedPeers {
            peers,
            scanned: in_scope.len(),
            resolved,
            unresolved: in_scope.len() - resolved,
        }
    }

    /// Pass 1: map each thread to the group identity it first announced.
    fn discover_groups(&self, messages: &[&MessageRow]) -> HashMap<String, Peer> {
        let mut groups: HashMap<String, Peer> = HashMap::new();
        for msg in messages {
            if self.policy.skip_system_messages && self.policy.is_system_message(msg) {
                continue;
            }
            if !ChatKind::from_raw(&msg.chat_type).is_group_like() {
                continue;
            }
            let thread = clean_identifier(&msg.thread_id);
            if thread.is_empty() {
                continue;
            }
            let name = clean_identifier(&msg.group_name);
            if name.is_empty() {
                continue;
            }
            groups.entry(thread).or_insert_with(|| Peer {
                kind: PeerKind::Group,
                name,
                id: clean_identifier(&msg.group_id),
            });
        }
        groups
    }

    /// Pass 2 priority ladder for one message.
    fn resolve_message(
        &self,
        msg: &MessageRow,
        thread: &str,
        groups: &HashMap<String, Peer>,
        persons: &HashMap<String, Peer>,
    ) -> Option<Peer> {
        // A thread known to be a group overrides the row's own fields.
        if !thread.is_empty() {
            if let Some(group) = groups.get(thread) {
                return Some(group.clone());
            }
        }

        let kind = ChatKind::from_raw(&msg.chat_type);
        if kind.is_group_like() {
            let name = clean_identifier(&msg.group_name);
            if !name.is_empty() {
                return Some(Peer {
                    kind: PeerKind::Group,
                    name,
                    id: clean_identifier(&msg.group_id),
                });
            }
            // A group row that never announced its name.
            return None;
        }

        let sender = side_of(&msg.sender_name, &msg.sender_id);
        let recipient = side_of(&msg.recipient_name, &msg.recipient_id);
        let (preferred, other) = match Direction::from_raw(&msg.direction) {
            Direction::Outgoing => (recipient, sender),
            // Without a direction the sender column is still the better
            // bet; self-exclusion flips to the recipient when the sender
            // turns out to be the owner.
            Direction::Incoming | Direction::Unknown => (sender, recipient),
        };

        match self.person_candidate(&preferred, &other) {
            Candidate::Resolved(peer) => return Some(peer),
            // Owner talking to owner carries no informative peer; the
            // thread map must not paper over it.
            Candidate::OwnerBothSides => return None,
            Candidate::Unusable => {}
        }
        if !thread.is_empty() {
            if let Some(person) = persons.get(thread) {
                return Some(person.clone());
            }
        }
        None
    }

    /// Candidate selection plus self-exclusion. When the preferred side is
    /// the device owner the other side is tried.
    fn person_candidate(&self, preferred: &Side, other: &Side) -> Candidate {
        let Some((name, id)) = self.policy.person_from(preferred) else {
            return Candidate::Unusable;
        };
        if !self.policy.matches_owner(&name, &self.owner_name) {
            return Candidate::Resolved(Peer { kind: PeerKind::Person, name, id });
        }
        let Some((name, id)) = self.policy.person_from(other) else {
            return Candidate::Unusable;
        };
        if self.policy.matches_owner(&name, &self.owner_name) {
            return Candidate::OwnerBothSides;
        }
        Candidate::Resolved(Peer { kind: PeerKind::Person, name, id })
    }

    /// Post-processing: per conversation, merge every slot into a primary
    /// peer, then sum each primary's tallies across conversations.
    fn aggregate(&self, slots: &[Peer], conversations: &[Vec<PeerStat>]) -> Vec<PeerIntensity> {
        #[derive(Default)]
        struct Total {
            name: String,
            id: String,
            intensity: usize,
            outgoing: usize,
            incoming: usize,
        }
        let mut totals: Vec<Total> = slots.iter().map(|_| Total::default()).collect();

        for stats in conversations {
            let Some(primary_at) = self.primary_position(slots, stats) else {
                continue;
            };
            let primary = stats[primary_at].slot;
            let total = &mut totals[primary];
            if total.name.is_empty() {
                total.name = slots[primary].name.clone();
            }
            if total.id.is_empty() {
                total.id = slots[primary].id.clone();
            }
            for stat in stats {
                total.intensity += stat.count;
                total.outgoing += stat.outgoing;
                total.incoming += stat.incoming;
                let merged = &slots[stat.slot];
                if !self.policy.good_primary_name(&total.name)
                    && self.policy.good_primary_name(&merged.name)
                {
                    total.name = merged.name.clone();
                }
                if total.id.is_empty() && !merged.id.is_empty() {
                    total.id = merged.id.clone();
                }
            }
        }

        let mut peers: Vec<PeerIntensity> = totals
            .into_iter()
            .enumerate()
            .filter(|(_, total)| total.intensity > 0)
            .map(|(slot, total)| PeerIntensity {
                peer: total.name,
                peer_id: total.id,
                kind: slots[slot].kind,
                intensity: total.intensity,
                direction: dominant(total.outgoing, total.incoming),
            })
            .collect();
        peers.sort_by(|a, b| b.intensity.cmp(&a.intensity));
        peers
    }

    /// The first slot with a real name; failing that, the busiest slot
    /// (first wins on ties).
    fn primary_position(&self, slots: &[Peer], stats: &[PeerStat]) -> Option<usize> {
        if stats.is_empty() {
            return None;
        }
        if let Some(at) = stats
            .iter()
            .position(|stat| self.policy.good_primary_name(&slots[stat.slot].name))
        {
            return Some(at);
        }
        let mut best = 0;
        for (at, stat) in stats.iter().enumerate() {
            if stat.count > stats[best].count {
                best = at;
            }
        }
        Some(best)
    }
}

fn tally(stats: &mut Vec<PeerStat>, slot: usize, direction: Direction) {
    let at = match stats.iter().position(|stat| stat.slot == slot) {
        Some(at) => at,
        None => {
            stats.push(PeerStat { slot, count: 0, outgoing: 0, incoming: 0 });
            stats.len() - 1
        }
    };
    stats[at].count += 1;
    match direction {
        Direction::Outgoing => stats[at].outgoing += 1,
        Direction::Incoming => stats[at].incoming += 1,
        Direction::Unknown => {}
    }
}

fn dominant(outgoing: usize, incoming: usize) -> Direction {
    match outgoing.cmp(&incoming) {
        std::cmp::Ordering::Greater => Direction::Outgoing,
        std::cmp::Ordering::Less => Direction::Incoming,
        std::cmp::Ordering::Equal => Direction::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn device() -> Device {
        Device::new(7, "Budi Santoso", "6281200001111", 1)
    }

    fn message(thread: &str, direction: &str, chat_type: &str) -> MessageRow {
        MessageRow {
            device_id: 7,
            platform: "WhatsApp".into(),
            thread_id: thread.into(),
            direction: direction.into(),
            chat_type: chat_type.into(),
            ..MessageRow::default()
        }
    }

    #[test]
    fn one_on_one_incoming_uses_the_sender() {
        let mut msg = message("t1", "received", "one on one");
        msg.sender_name = "Alice".into();
        msg.sender_id = "628111@s.whatsapp.net".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[msg]);
        assert_eq!(out.peers.len(), 1);
        assert_eq!(out.peers[0].peer, "Alice");
        assert_eq!(out.peers[0].peer_id, "628111");
        assert_eq!(out.peers[0].direction, Direction::Incoming);
    }

    #[test]
    fn ambiguous_rows_fall_back_to_the_thread_person() {
        let mut first = message("t1", "received", "one on one");
        first.sender_name = "Alice".into();
        let mut second = message("t1", "sent", "one on one");
        second.message_id = 2;

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[first, second]);
        assert_eq!(out.peers.len(), 1);
        assert_eq!(out.peers[0].peer, "Alice");
        assert_eq!(out.peers[0].intensity, 2);
        assert_eq!(out.resolved, 2);
    }

    #[test]
    fn group_identity_wins_over_later_row_fields() {
        let mut opener = message("t2", "received", "group");
        opener.group_name = "Family".into();
        opener.group_id = "g-22".into();
        let mut later = message("t2", "sent", "");
        later.recipient_name = "Alice".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[opener, later]);
        assert_eq!(out.peers.len(), 1);
        assert_eq!(out.peers[0].peer, "Family");
        assert_eq!(out.peers[0].peer_id, "g-22");
        assert_eq!(out.peers[0].kind, PeerKind::Group);
        assert_eq!(out.peers[0].intensity, 2);
    }

    #[test]
    fn owner_as_recipient_swaps_to_the_sender() {
        let mut msg = message("t3", "sent", "");
        msg.recipient_name = "Budi Santoso".into();
        msg.sender_name = "Sari".into();
        msg.sender_id = "628222".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[msg]);
        assert_eq!(out.peers.len(), 1);
        assert_eq!(out.peers[0].peer, "Sari");
    }

    #[test]
    fn owner_on_both_sides_is_unresolved() {
        let mut msg = message("t3", "sent", "");
        msg.recipient_name = "Budi Santoso".into();
        msg.sender_name = "Budi".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[msg]);
        assert!(out.peers.is_empty());
        assert_eq!(out.unresolved, 1);
    }

    #[test]
    fn owner_echo_does_not_inherit_the_thread_person() {
        let mut real = message("t3", "received", "");
        real.sender_name = "Sari".into();
        let mut echo = message("t3", "sent", "");
        echo.message_id = 2;
        echo.sender_name = "Budi".into();
        echo.recipient_name = "Budi Santoso".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[real, echo]);
        assert_eq!(out.peers.len(), 1);
        assert_eq!(out.peers[0].peer, "Sari");
        assert_eq!(out.peers[0].intensity, 1);
        assert_eq!(out.unresolved, 1);
    }

    #[test]
    fn bare_long_id_becomes_the_peer_name() {
        let mut msg = message("t4", "sent", "");
        msg.recipient_id = "0812345678901234567890".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[msg]);
        assert_eq!(out.peers.len(), 1);
        assert_eq!(out.peers[0].peer, "0812345678901234567890");
        assert_eq!(out.peers[0].peer_id, "0812345678901234567890");
    }

    #[test]
    fn unreliable_digit_names_are_passed_over() {
        let mut msg = message("t5", "sent", "");
        msg.recipient_name = "1".repeat(21);
        msg.recipient_id = "628333".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[msg]);
        assert_eq!(out.peers[0].peer, "628333");
    }

    #[test]
    fn numeric_peers_merge_into_the_named_primary() {
        let mut by_number = message("t6", "received", "");
        by_number.sender_name = "628444".into();
        let mut by_name = message("t6", "received", "");
        by_name.message_id = 2;
        by_name.sender_name = "Citra Lestari".into();
        by_name.sender_id = "628444".into();
        let mut again = message("t6", "received", "");
        again.message_id = 3;
        again.sender_name = "628444".into();

        let out =
            ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[by_number, by_name, again]);
        assert_eq!(out.peers.len(), 1);
        assert_eq!(out.peers[0].peer, "Citra Lestari");
        assert_eq!(out.peers[0].peer_id, "628444");
        assert_eq!(out.peers[0].intensity, 3);
    }

    #[test]
    fn intensity_sorts_descending() {
        let mut quiet = message("t7", "received", "one on one");
        quiet.sender_name = "Alice".into();
        let mut busy1 = message("t8", "received", "one on one");
        busy1.sender_name = "Rudi".into();
        let mut busy2 = message("t8", "sent", "one on one");
        busy2.message_id = 2;
        busy2.recipient_name = "Rudi".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[quiet, busy1, busy2]);
        assert_eq!(out.peers[0].peer, "Rudi");
        assert_eq!(out.peers[0].intensity, 2);
        assert_eq!(out.peers[0].direction, Direction::Unknown);
        assert_eq!(out.peers[1].peer, "Alice");
    }

    #[test]
    fn other_platforms_are_out_of_scope() {
        let mut ours = message("t9", "received", "one on one");
        ours.sender_name = "Alice".into();
        let mut foreign = message("t9", "received", "one on one");
        foreign.platform = "Telegram".into();
        foreign.sender_name = "Bob".into();
        let mut elsewhere = message("t9", "received", "one on one");
        elsewhere.device_id = 99;
        elsewhere.sender_name = "Carol".into();

        let out =
            ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[ours, foreign, elsewhere]);
        assert_eq!(out.scanned, 1);
        assert_eq!(out.peers.len(), 1);
        assert_eq!(out.peers[0].peer, "Alice");
    }

    #[test]
    fn system_messages_are_skipped() {
        let mut notice = message("t10", "received", "one on one");
        notice.sender_id = "0".into();
        notice.text = "*Not even WhatsApp can see your personal messages*".into();
        let mut real = message("t10", "received", "one on one");
        real.message_id = 2;
        real.sender_name = "Alice".into();

        let out = ThreadPeerResolver::new(&device(), "whatsapp").resolve(&[notice, real]);
        assert_eq!(out.resolved, 1);
        assert_eq!(out.unresolved, 1);
        assert_eq!(out.peers[0].intensity, 1);
    }
}
