use serde::de::{Deserializer, Error as _, Unexpected};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// The FPP API omits zero-valued keys, sends `null` for unset ones and quotes
// many of its counters (`"count": "4"`). Every field is therefore
// `#[serde(default)]` and numeric strings are coerced to numbers. Anything
// else of the wrong JSON type is an error.
//
// Status leaves are `Option`s so that a missing or `null` value stays unset
// and is left out again on encode. The accessors of the same name return the
// value or its default. Nested status records are left out when every leaf
// in them is unset.

/// Generates accessors returning a status leaf, or its default when unset
///
/// `copy` fields return the value itself, `deref` fields borrow it
/// (`&str`, `&[String]`).
macro_rules! accessors {
    (@get copy, $field:expr) => {
        $field.unwrap_or_default()
    };
    (@get deref, $field:expr) => {
        $field.as_deref().unwrap_or_default()
    };
    ($ty:ident { $($field:ident: $ret:ty = $how:ident),* $(,)? }) => {
        impl $ty {
            $(
                #[doc = concat!("`", stringify!($field), "`, or its default when unset")]
                pub fn $field(&self) -> $ret {
                    accessors!(@get $how, self.$field)
                }
            )*
        }
    };
}

/// Playlist currently playing or paused
///
/// ```json
/// "current_playlist": {
///   "count": "4",
///   "description": "Full Test 1",
///   "index": "2",
///   "playlist": "Test1",
///   "type": "pause"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentPlaylist {
    /// Total number of items
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_int")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_int")]
    pub index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

accessors!(CurrentPlaylist {
    count: i64 = copy,
    description: &str = deref,
    index: i64 = copy,
    playlist: &str = deref,
    kind: &str = deref,
});

/// Next scheduled playlist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextPlaylist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
}

accessors!(NextPlaylist {
    playlist: &str = deref,
    start_time: &str = deref,
});

/// MQTT integration state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttStatus {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configured: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
}

accessors!(MqttStatus {
    configured: bool = copy,
    connected: bool = copy,
});

/// Host resource usage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStatusAdvanceViewUtilization {
    /// CPU usage in percent
    #[serde(
        rename = "CPU",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_float"
    )]
    pub cpu: Option<f64>,
    /// Memory usage in percent
    #[serde(
        rename = "Memory",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_float"
    )]
    pub memory: Option<f64>,
    /// Human readable uptime
    #[serde(rename = "Uptime", skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
}

accessors!(SystemStatusAdvanceViewUtilization {
    cpu: f64 = copy,
    memory: f64 = copy,
    uptime: &str = deref,
});

/// Host and build metadata from the `advancedView` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStatusAdvanceView {
    #[serde(rename = "HostName", skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(rename = "HostDescription", skip_serializing_if = "Option::is_none")]
    pub host_description: Option<String>,
    #[serde(rename = "Platform", skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(rename = "Variant", skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(rename = "Mode", skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(rename = "Version", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "Branch", skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(rename = "OSVersion", skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(rename = "OSRelease", skip_serializing_if = "Option::is_none")]
    pub os_release: Option<String>,
    #[serde(rename = "channelRanges", skip_serializing_if = "Option::is_none")]
    pub channel_ranges: Option<String>,
    #[serde(
        rename = "majorVersion",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_int"
    )]
    pub major_version: Option<i64>,
    #[serde(
        rename = "minorVersion",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_int"
    )]
    pub minor_version: Option<i64>,
    #[serde(
        rename = "typeId",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_int"
    )]
    pub type_id: Option<i64>,
    #[serde(
        rename = "Utilization",
        skip_serializing_if = "is_unset",
        deserialize_with = "null_as_default"
    )]
    pub utilization: SystemStatusAdvanceViewUtilization,
    #[serde(rename = "Kernel", skip_serializing_if = "Option::is_none")]
    pub kernel: Option<String>,
    #[serde(rename = "LocalGitVersion", skip_serializing_if = "Option::is_none")]
    pub local_git_version: Option<String>,
    #[serde(rename = "RemoteGitVersion", skip_serializing_if = "Option::is_none")]
    pub remote_git_version: Option<String>,
    #[serde(rename = "UpgradeSource", skip_serializing_if = "Option::is_none")]
    pub upgrade_source: Option<String>,
    #[serde(rename = "IPs", skip_serializing_if = "Option::is_none")]
    pub ips: Option<Vec<String>>,
}

accessors!(SystemStatusAdvanceView {
    host_name: &str = deref,
    host_description: &str = deref,
    platform: &str = deref,
    variant: &str = deref,
    mode: &str = deref,
    version: &str = deref,
    branch: &str = deref,
    os_version: &str = deref,
    os_release: &str = deref,
    channel_ranges: &str = deref,
    major_version: i64 = copy,
    minor_version: i64 = copy,
    type_id: i64 = copy,
    kernel: &str = deref,
    local_git_version: &str = deref,
    remote_git_version: &str = deref,
    upgrade_source: &str = deref,
    ips: &[String] = deref,
});

/// Device-wide status from `GET /api/system/status`
///
/// Decoding and re-encoding keeps the payload's shape: keys that were
/// missing or `null` stay out of the encoded form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemStatus {
    #[serde(
        rename = "MQTT",
        skip_serializing_if = "is_unset",
        deserialize_with = "null_as_default"
    )]
    pub mqtt: MqttStatus,
    /// fppd daemon state, e.g. `running`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fppd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_int")]
    pub mode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_int")]
    pub volume: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_sequence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_song: Option<String>,
    #[serde(skip_serializing_if = "is_unset", deserialize_with = "null_as_default")]
    pub current_playlist: CurrentPlaylist,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_playlist: Option<NextPlaylist>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_int")]
    pub seconds_played: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_int")]
    pub seconds_elapsed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_int")]
    pub seconds_remaining: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_int")]
    pub repeat_mode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    #[serde(
        rename = "advancedView",
        skip_serializing_if = "is_unset",
        deserialize_with = "null_as_default"
    )]
    pub advanced_view: SystemStatusAdvanceView,
}

accessors!(SystemStatus {
    fppd: &str = deref,
    mode: i64 = copy,
    mode_name: &str = deref,
    status_name: &str = deref,
    volume: i64 = copy,
    current_sequence: &str = deref,
    current_song: &str = deref,
    seconds_played: i64 = copy,
    seconds_elapsed: i64 = copy,
    seconds_remaining: i64 = copy,
    repeat_mode: i64 = copy,
    time: &str = deref,
    uptime: &str = deref,
});

/// Sequence known to the device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sequence {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
}

/// Entry of a playlist's lead-in or main section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistItem {
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "lenient_int_or_zero")]
    pub enabled: i64,
    #[serde(rename = "playOnce", deserialize_with = "lenient_int_or_zero")]
    pub play_once: i64,
    #[serde(rename = "sequenceName", deserialize_with = "null_as_default")]
    pub sequence_name: String,
    #[serde(rename = "mediaName", deserialize_with = "null_as_default")]
    pub media_name: String,
    #[serde(rename = "videoOut", deserialize_with = "null_as_default")]
    pub video_out: String,
    #[serde(deserialize_with = "null_as_default")]
    pub timecode: String,
    /// Duration in seconds
    #[serde(deserialize_with = "lenient_duration")]
    pub duration: f64,
}

const DEFAULT_ITEM_DURATION: f64 = 220.025;

impl Default for PlaylistItem {
    fn default() -> Self {
        Self {
            kind: String::new(),
            enabled: 0,
            play_once: 0,
            sequence_name: String::new(),
            media_name: String::new(),
            video_out: String::new(),
            timecode: String::new(),
            duration: DEFAULT_ITEM_DURATION,
        }
    }
}

/// Playlist stored on the device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Playlist {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "lenient_int_or_zero")]
    pub version: i64,
    #[serde(deserialize_with = "lenient_int_or_zero")]
    pub repeat: i64,
    #[serde(rename = "loopCount", deserialize_with = "lenient_int_or_zero")]
    pub loop_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub empty: bool,
    #[serde(rename = "desc", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "lenient_int_or_zero")]
    pub random: i64,
    #[serde(rename = "leadIn", deserialize_with = "null_as_default")]
    pub lead_in: Vec<PlaylistItem>,
    #[serde(rename = "mainPlaylist", deserialize_with = "null_as_default")]
    pub main_playlist: Vec<PlaylistItem>,
}

/// Everything known about one FPP device
///
/// Built from the three endpoints fetched by
/// [`FppClient::update`](crate::FppClient::update).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub system_status: SystemStatus,
    pub playlists: Vec<Playlist>,
    pub sequences: Vec<Sequence>,
}

impl Device {
    /// Names of all playlists, in device order
    pub fn playlist_names(&self) -> Vec<&str> {
        self.playlists.iter().map(|p| p.name.as_str()).collect()
    }

    /// Names of all sequences, in device order
    pub fn sequence_names(&self) -> Vec<&str> {
        self.sequences.iter().map(|s| s.name.as_str()).collect()
    }

    /// Replace each sub-tree present in `update`, leaving the others as they are
    pub fn apply(&mut self, update: DeviceUpdate) {
        if let Some(system_status) = update.system_status {
            self.system_status = system_status;
        }
        if let Some(playlists) = update.playlists {
            self.playlists = playlists;
        }
        if let Some(sequences) = update.sequences {
            self.sequences = sequences;
        }
    }
}

/// Decoded sub-trees of an incremental update
///
/// `None` means the corresponding payload was missing or empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceUpdate {
    pub system_status: Option<SystemStatus>,
    pub playlists: Option<Vec<Playlist>>,
    pub sequences: Option<Vec<Sequence>>,
}

fn is_unset<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| D::Error::invalid_type(unexpected_number(&n), &"an integer")),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&s), &"an integer")),
        other => Err(D::Error::invalid_type(unexpected(&other), &"an integer")),
    }
}

fn lenient_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| D::Error::invalid_type(unexpected_number(&n), &"a number")),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&s), &"a number")),
        other => Err(D::Error::invalid_type(unexpected(&other), &"a number")),
    }
}

fn lenient_int_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_int(deserializer)?.unwrap_or_default())
}

fn lenient_duration<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_float(deserializer)?.unwrap_or(DEFAULT_ITEM_DURATION))
}

fn unexpected_number(n: &serde_json::Number) -> Unexpected<'_> {
    if let Some(u) = n.as_u64() {
        Unexpected::Unsigned(u)
    } else if let Some(f) = n.as_f64() {
        Unexpected::Float(f)
    } else {
        Unexpected::Other("number")
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(*b),
        Value::Number(n) => unexpected_number(n),
        Value::String(s) => Unexpected::Str(s),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}
