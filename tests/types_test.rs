// Encode/decode behaviour of the domain records against device-shaped JSON.

use serde_json::json;

use fpp_client::payload::{decode_device, decode_system_status};
use fpp_client::{NextPlaylist, SystemStatus};

#[test]
fn test_populated_status_survives_encode_decode() {
    let raw = json!({
        "MQTT": {"configured": true, "connected": true},
        "fppd": "running",
        "mode": 2,
        "mode_name": "player",
        "status": 1,
        "status_name": "playing",
        "volume": 64,
        "current_sequence": "Carol.fseq",
        "current_song": "Carol.mp3",
        "current_playlist": {
            "count": "4",
            "description": "Holiday",
            "index": "1",
            "playlist": "Holiday",
            "type": "sequence"
        },
        "next_playlist": {"playlist": "Finale", "start_time": "21:00"},
        "seconds_played": "12",
        "seconds_elapsed": "12",
        "seconds_remaining": "168",
        "repeat_mode": "0",
        "time": "Fri Dec 13 20:15:00 UTC 2024",
        "uptime": "2 days",
        "advancedView": {
            "HostName": "fpp-house",
            "HostDescription": "Front yard",
            "Platform": "Raspberry Pi",
            "Variant": "Pi 4",
            "Mode": "player",
            "Version": "7.4",
            "Branch": "v7.4",
            "OSVersion": "v2023-09",
            "OSRelease": "Debian 11",
            "channelRanges": "0-4095",
            "majorVersion": 7,
            "minorVersion": 4,
            "typeId": 13,
            "Utilization": {"CPU": 7.5, "Memory": 31.0, "Uptime": "2 days"},
            "Kernel": "6.1.21",
            "LocalGitVersion": "abc123",
            "RemoteGitVersion": "abc123",
            "UpgradeSource": "github.com",
            "IPs": ["192.168.1.60"]
        }
    });

    let status = decode_system_status(raw).unwrap();
    assert_eq!(status.repeat_mode, Some(0));
    assert_eq!(status.seconds_remaining(), 168);
    assert_eq!(
        status.next_playlist,
        Some(NextPlaylist {
            playlist: Some("Finale".into()),
            start_time: Some("21:00".into()),
        })
    );

    let encoded = serde_json::to_value(&status).unwrap();
    assert_eq!(encoded["current_playlist"]["type"], "sequence");
    assert_eq!(encoded["advancedView"]["HostName"], "fpp-house");
    assert_eq!(encoded["advancedView"]["Utilization"]["CPU"], 7.5);

    let decoded: SystemStatus = serde_json::from_value(encoded).unwrap();
    assert_eq!(decoded, status);
}

#[test]
fn test_device_from_bare_name_lists() {
    let payload = json!({
        "system_status": {"fppd": "running", "volume": 50, "uptime": null},
        "playlists": ["Main Show", "Test1"],
        "sequences": ["introA", "introB"]
    });

    let device = decode_device(payload.as_object().unwrap().clone()).unwrap();

    assert_eq!(device.playlist_names(), vec!["Main Show", "Test1"]);
    assert_eq!(device.sequence_names(), vec!["introA", "introB"]);
    assert_eq!(device.playlists[0].loop_count, 0);
    assert!(device.system_status.next_playlist.is_none());

    let encoded = serde_json::to_value(&device).unwrap();
    assert!(encoded["system_status"].get("next_playlist").is_none());
    assert!(encoded["system_status"].get("uptime").is_none());
    assert_eq!(encoded["sequences"][1]["name"], "introB");
}

#[test]
fn test_null_fields_are_omitted_on_encode() {
    let status = decode_system_status(json!({
        "fppd": "running",
        "current_song": null,
        "volume": null,
        "seconds_played": "12",
        "current_playlist": {"playlist": "Holiday", "count": null},
        "MQTT": null,
        "advancedView": {"HostName": "fpp-house", "IPs": null, "Utilization": {"CPU": null}}
    }))
    .unwrap();

    assert_eq!(status.volume(), 0);
    assert_eq!(status.current_song(), "");

    let encoded = serde_json::to_value(&status).unwrap();
    assert_eq!(
        encoded,
        json!({
            "fppd": "running",
            "seconds_played": 12,
            "current_playlist": {"playlist": "Holiday"},
            "advancedView": {"HostName": "fpp-house"}
        })
    );
}
