//! Bridge routing.
//!
//! Decides what happens to a single inbound webhook call: which side sent it,
//! whether it must be dropped, and what gets delivered to the other side.
//! Pure logic; the HTTP plumbing lives in `server`.

use serde::{Deserialize, Serialize};

use crate::config::{BridgeConfig, SideConfig};

// ── Message Types ────────────────────────────────────────────────────────────

/// Form fields of a chat platform's outgoing-webhook call.
///
/// Missing fields are read as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub text: String,
}

/// JSON body posted to a side's incoming webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundPayload {
    pub text: String,
    pub username: String,
}

/// Which way a message travels across a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    AToB,
    BToA,
}

impl Direction {
    /// Side the message came from.
    pub fn origin(self) -> char {
        match self {
            Self::AToB => 'a',
            Self::BToA => 'b',
        }
    }

    /// Side the message is delivered to.
    pub fn destination(self) -> char {
        match self {
            Self::AToB => 'b',
            Self::BToA => 'a',
        }
    }
}

/// Outcome of routing one inbound call.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteDecision<'a> {
    /// Token matches neither side.
    Unauthorized,
    /// Author name carries the relay marker; the message is our own echo.
    Suppressed { direction: Direction },
    /// Destination side has no outbound url configured.
    NoDestination { direction: Direction },
    /// Deliver `payload` to `url`.
    Forward {
        direction: Direction,
        url: &'a str,
        payload: OutboundPayload,
    },
}

// ── Route ────────────────────────────────────────────────────────────────────

/// Routing state for one enabled bridge.
///
/// Each bridge endpoint owns its own `BridgeRoute`, built from a copy of the
/// bridge's configuration.
#[derive(Debug, Clone)]
pub struct BridgeRoute {
    bridge: BridgeConfig,
    relay_marker: String,
}

impl BridgeRoute {
    pub fn new(bridge: BridgeConfig, relay_marker: impl Into<String>) -> Self {
        Self {
            bridge,
            relay_marker: relay_marker.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.bridge.name
    }

    /// Identify the originating side from the call's token.
    ///
    /// Side a is checked first. Configs where both sides share a token are
    /// rejected at load time, so the order only matters for hand-built routes.
    pub fn direction(&self, token: &str) -> Option<Direction> {
        if token == self.bridge.a.from.token {
            Some(Direction::AToB)
        } else if token == self.bridge.b.from.token {
            Some(Direction::BToA)
        } else {
            None
        }
    }

    /// Whether `user_name` identifies a message this bridge relayed itself.
    pub fn is_relayed(&self, user_name: &str) -> bool {
        !self.relay_marker.is_empty() && user_name.contains(&self.relay_marker)
    }

    /// Authenticate, filter and transform one inbound message.
    pub fn route(&self, msg: &InboundMessage) -> RouteDecision<'_> {
        let Some(direction) = self.direction(&msg.token) else {
            return RouteDecision::Unauthorized;
        };

        if self.is_relayed(&msg.user_name) {
            return RouteDecision::Suppressed { direction };
        }

        let (from, to) = self.sides(direction);
        if to.to.url.is_empty() {
            return RouteDecision::NoDestination { direction };
        }

        RouteDecision::Forward {
            direction,
            url: &to.to.url,
            payload: OutboundPayload {
                text: msg.text.clone(),
                username: format!("{}-{}", from.from.prefix, msg.user_name),
            },
        }
    }

    /// `(origin, destination)` sides for a direction.
    fn sides(&self, direction: Direction) -> (&SideConfig, &SideConfig) {
        match direction {
            Direction::AToB => (&self.bridge.a, &self.bridge.b),
            Direction::BToA => (&self.bridge.b, &self.bridge.a),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Source, Target, DEFAULT_RELAY_MARKER};

    fn side(url: &str, prefix: &str, token: &str) -> SideConfig {
        SideConfig {
            to: Target {
                url: url.to_string(),
            },
            from: Source {
                prefix: prefix.to_string(),
                token: token.to_string(),
            },
        }
    }

    fn test_route() -> BridgeRoute {
        BridgeRoute::new(
            BridgeConfig {
                name: "general".to_string(),
                enabled: true,
                endpoint: "/general".to_string(),
                a: side("http://side-a/webhook", "A", "tA"),
                b: side("http://side-b/webhook", "B", "tB"),
            },
            DEFAULT_RELAY_MARKER,
        )
    }

    fn message(token: &str, user_name: &str, text: &str) -> InboundMessage {
        InboundMessage {
            token: token.to_string(),
            user_name: user_name.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_unknown_token_is_unauthorized() {
        let route = test_route();
        assert_eq!(route.route(&message("nope", "alice", "hi")), RouteDecision::Unauthorized);
        assert_eq!(route.route(&message("", "alice", "hi")), RouteDecision::Unauthorized);
    }

    #[test]
    fn test_side_a_forwards_to_side_b() {
        let route = test_route();
        assert_eq!(
            route.route(&message("tA", "alice", "hi")),
            RouteDecision::Forward {
                direction: Direction::AToB,
                url: "http://side-b/webhook",
                payload: OutboundPayload {
                    text: "hi".to_string(),
                    username: "A-alice".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_side_b_forwards_to_side_a() {
        let route = test_route();
        assert_eq!(
            route.route(&message("tB", "carol", "yo")),
            RouteDecision::Forward {
                direction: Direction::BToA,
                url: "http://side-a/webhook",
                payload: OutboundPayload {
                    text: "yo".to_string(),
                    username: "B-carol".to_string(),
                },
            }
        );
    }

    #[test]
    fn test_relayed_author_is_suppressed() {
        let route = test_route();
        for _ in 0..3 {
            assert_eq!(
                route.route(&message("tA", "slackbot", "echo")),
                RouteDecision::Suppressed {
                    direction: Direction::AToB
                }
            );
        }
        assert!(route.is_relayed("my-slackbot-relay"));
        assert!(!route.is_relayed("alice"));
    }

    #[test]
    fn test_bad_token_checked_before_suppression() {
        let route = test_route();
        assert_eq!(
            route.route(&message("nope", "slackbot", "echo")),
            RouteDecision::Unauthorized
        );
    }

    #[test]
    fn test_inbound_only_destination() {
        let mut route = test_route();
        route.bridge.b.to.url.clear();
        assert_eq!(
            route.route(&message("tA", "alice", "hi")),
            RouteDecision::NoDestination {
                direction: Direction::AToB
            }
        );
    }

    #[test]
    fn test_text_is_passed_through_unmodified() {
        let route = test_route();
        let text = "  multi\nline <b>&amp; ünïcode</b> ";
        match route.route(&message("tB", "dave", text)) {
            RouteDecision::Forward { payload, .. } => assert_eq!(payload.text, text),
            other => panic!("unexpected decision: {other:?}"),
        }
    }

    #[test]
    fn test_shared_token_resolves_to_side_a() {
        let mut route = test_route();
        route.bridge.b.from.token = "tA".to_string();
        assert_eq!(route.direction("tA"), Some(Direction::AToB));
    }

    #[test]
    fn test_payload_json_shape() {
        let payload = OutboundPayload {
            text: "hi".to_string(),
            username: "A-alice".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"text":"hi","username":"A-alice"}"#
        );
    }

    #[test]
    fn test_direction_labels() {
        assert_eq!(Direction::AToB.origin(), 'a');
        assert_eq!(Direction::AToB.destination(), 'b');
        assert_eq!(Direction::BToA.origin(), 'b');
        assert_eq!(Direction::BToA.destination(), 'a');
    }
}
