//! Schema registry: packet type number -> packet schema.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{ProtocolError, Result};
use crate::types::{
    FieldKind, PACKET_CHAT_MSG, PACKET_GAME_INFO, PACKET_PROCESSING_FINISHED,
    PACKET_PROCESSING_STARTED, PACKET_RULESET_CONTROL, PACKET_RULESET_DESCRIPTION_PART,
    PACKET_RULESET_UNIT_BONUS, PACKET_RULESET_UNIT_CLASS, PACKET_RULESET_UNIT_FLAG,
    PACKET_SERVER_INFO, PACKET_SERVER_JOIN_REPLY, PACKET_SERVER_JOIN_REQ,
};

use super::{FieldSchema, PacketSchema};

/// Immutable-after-setup table of packet schemas.
///
/// Built once at startup, then shared behind `Arc` by the dispatcher and
/// any tooling that needs to decode captures. Registering two schemas for
/// the same packet type is a construction error.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<u16, Arc<PacketSchema>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. Fails if the packet type is already taken.
    pub fn register(&mut self, schema: PacketSchema) -> Result<()> {
        let packet_type = schema.packet_type;
        if self.schemas.contains_key(&packet_type) {
            return Err(ProtocolError::schema_invalid(format!(
                "packet type {packet_type} registered twice"
            )));
        }
        self.schemas.insert(packet_type, Arc::new(schema));
        Ok(())
    }

    /// Look up the schema for a packet type.
    pub fn lookup(&self, packet_type: u16) -> Result<&Arc<PacketSchema>> {
        self.schemas.get(&packet_type).ok_or(ProtocolError::NotRegistered { packet_type })
    }

    /// Whether a packet type has a schema.
    pub fn contains(&self, packet_type: u16) -> bool {
        self.schemas.contains_key(&packet_type)
    }

    /// Number of registered packet types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Build the registry seeded with the packets the client speaks today.
///
/// Negotiation packets (0, 1, 4, 5) are non-delta; everything that arrives
/// after the join handshake is delta encoded unless the protocol definition
/// says otherwise. Additions go here and nowhere else - the codec layers
/// take whatever the registry hands them.
pub fn baseline_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    let mut add = |schema: Result<PacketSchema>| {
        let schema = schema.expect("baseline schema is statically valid");
        registry.register(schema).expect("baseline packet types are unique");
    };

    add(PacketSchema::new(PACKET_PROCESSING_STARTED, "processing_started", false, vec![]));
    add(PacketSchema::new(PACKET_PROCESSING_FINISHED, "processing_finished", false, vec![]));

    add(PacketSchema::new(
        PACKET_SERVER_JOIN_REQ,
        "server_join_req",
        false,
        vec![
            FieldSchema::scalar("username", FieldKind::String),
            FieldSchema::scalar("capability", FieldKind::String),
            FieldSchema::scalar("version_label", FieldKind::String),
            FieldSchema::scalar("major_version", FieldKind::U32),
            FieldSchema::scalar("minor_version", FieldKind::U32),
            FieldSchema::scalar("patch_version", FieldKind::U32),
        ],
    ));

    add(PacketSchema::new(
        PACKET_SERVER_JOIN_REPLY,
        "server_join_reply",
        false,
        vec![
            FieldSchema::scalar("you_can_join", FieldKind::Bool),
            FieldSchema::scalar("message", FieldKind::String),
            FieldSchema::scalar("capability", FieldKind::String),
            FieldSchema::scalar("challenge_file", FieldKind::String),
        ],
    ));

    add(PacketSchema::new(
        PACKET_SERVER_INFO,
        "server_info",
        true,
        vec![
            FieldSchema::scalar("version_label", FieldKind::String),
            FieldSchema::scalar("major_version", FieldKind::U32),
            FieldSchema::scalar("minor_version", FieldKind::U32),
            FieldSchema::scalar("patch_version", FieldKind::U32),
            FieldSchema::scalar("emerg_version", FieldKind::U32),
        ],
    ));

    add(PacketSchema::new(
        PACKET_CHAT_MSG,
        "chat_msg",
        true,
        vec![
            FieldSchema::scalar("message", FieldKind::String),
            FieldSchema::scalar("tile", FieldKind::S32),
            FieldSchema::scalar("event", FieldKind::S16),
            FieldSchema::scalar("turn", FieldKind::S16),
            FieldSchema::scalar("phase", FieldKind::S16),
            FieldSchema::scalar("conn_id", FieldKind::S16),
        ],
    ));

    // A_LAST = 401 technologies, B_LAST = 200 buildings; both arrays use
    // the sparse diff encoding
    add(PacketSchema::new(
        PACKET_GAME_INFO,
        "game_info",
        true,
        vec![
            FieldSchema::scalar("global_advance_count", FieldKind::U16),
            FieldSchema::array_diff("global_advances", FieldKind::Bool, 401),
            FieldSchema::array_diff("great_wonder_owners", FieldKind::S8, 200),
        ],
    ));

    add(PacketSchema::new(
        PACKET_RULESET_CONTROL,
        "ruleset_control",
        true,
        vec![
            FieldSchema::scalar("num_unit_classes", FieldKind::U16),
            FieldSchema::scalar("num_unit_types", FieldKind::U16),
            FieldSchema::scalar("num_impr_types", FieldKind::U16),
            FieldSchema::scalar("num_tech_classes", FieldKind::U16),
            FieldSchema::scalar("num_tech_types", FieldKind::U16),
            FieldSchema::scalar("num_extra_types", FieldKind::U16),
            FieldSchema::scalar("num_base_types", FieldKind::U16),
            FieldSchema::scalar("num_road_types", FieldKind::U16),
            FieldSchema::scalar("num_resource_types", FieldKind::U16),
            FieldSchema::scalar("num_goods_types", FieldKind::U16),
            FieldSchema::scalar("num_disaster_types", FieldKind::U16),
            FieldSchema::scalar("num_achievement_types", FieldKind::U16),
            FieldSchema::scalar("num_multipliers", FieldKind::U16),
            FieldSchema::scalar("num_styles", FieldKind::U16),
            FieldSchema::scalar("num_music_styles", FieldKind::U16),
            FieldSchema::scalar("government_count", FieldKind::U16),
            FieldSchema::scalar("nation_count", FieldKind::U16),
            FieldSchema::scalar("num_city_styles", FieldKind::U16),
            FieldSchema::scalar("terrain_count", FieldKind::U16),
            FieldSchema::scalar("num_specialist_types", FieldKind::U16),
            FieldSchema::scalar("num_nation_groups", FieldKind::U16),
            FieldSchema::scalar("num_nation_sets", FieldKind::U16),
            FieldSchema::scalar("preferred_tileset", FieldKind::String),
            FieldSchema::scalar("preferred_soundset", FieldKind::String),
            FieldSchema::scalar("preferred_musicset", FieldKind::String),
            FieldSchema::scalar("popup_tech_help", FieldKind::Bool),
            FieldSchema::scalar("name", FieldKind::String),
            FieldSchema::scalar("version", FieldKind::String),
            FieldSchema::scalar("alt_dir", FieldKind::String),
            FieldSchema::scalar("desc_length", FieldKind::U32),
            FieldSchema::scalar("num_counters", FieldKind::U16),
        ],
    ));

    // Chunked ruleset description; the client accumulates parts until it
    // has desc_length bytes
    add(PacketSchema::new(
        PACKET_RULESET_DESCRIPTION_PART,
        "ruleset_description_part",
        false,
        vec![FieldSchema::scalar("text", FieldKind::String)],
    ));

    add(PacketSchema::new(
        PACKET_RULESET_UNIT_CLASS,
        "ruleset_unit_class",
        true,
        vec![
            FieldSchema::scalar("id", FieldKind::U8),
            FieldSchema::scalar("name", FieldKind::String),
            FieldSchema::scalar("rule_name", FieldKind::String),
            FieldSchema::scalar("min_speed", FieldKind::U32),
            FieldSchema::scalar("hp_loss_pct", FieldKind::U8),
            FieldSchema::scalar("non_native_def_pct", FieldKind::U16),
            FieldSchema::scalar("flags", FieldKind::U32),
            FieldSchema::scalar("helptext", FieldKind::String),
        ],
    ));

    add(PacketSchema::new(
        PACKET_RULESET_UNIT_BONUS,
        "ruleset_unit_bonus",
        true,
        vec![
            FieldSchema::key("unit", FieldKind::U16),
            FieldSchema::key("flag", FieldKind::U8),
            FieldSchema::key("type", FieldKind::U8),
            FieldSchema::key("value", FieldKind::S16),
            FieldSchema::key("quiet", FieldKind::Bool),
        ],
    ));

    add(PacketSchema::new(
        PACKET_RULESET_UNIT_FLAG,
        "ruleset_unit_flag",
        true,
        vec![
            FieldSchema::scalar("id", FieldKind::U8),
            FieldSchema::scalar("name", FieldKind::String),
            FieldSchema::scalar("helptxt", FieldKind::String),
        ],
    ));

    registry
}
