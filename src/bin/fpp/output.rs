//! Terminal rendering for the `fpp` CLI.

use fpp_client::{Device, DiscoveredDevice};
use owo_colors::OwoColorize;
use tabled::builder::Builder;
use tabled::settings::{Panel, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct PropertyRow {
    #[tabled(rename = "Property")]
    property: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Addresses")]
    addresses: String,
}

/// Two-column property table of a device snapshot
pub fn render_device(device: &Device) -> String {
    let status = &device.system_status;
    let playlist = &status.current_playlist;
    let adv = &status.advanced_view;
    let util = &adv.utilization;

    let rows: Vec<(&str, String)> = vec![
        ("FPP Status", status.fppd().to_string()),
        ("mode_name", status.mode_name().to_string()),
        ("status_name", status.status_name().to_string()),
        ("volume", status.volume().to_string()),
        ("current_sequence", status.current_sequence().to_string()),
        ("current_song", status.current_song().to_string()),
        ("seconds_played", status.seconds_played().to_string()),
        ("seconds_elapsed", status.seconds_elapsed().to_string()),
        ("seconds_remaining", status.seconds_remaining().to_string()),
        ("repeat_mode", status.repeat_mode().to_string()),
        ("current_playlist: count", playlist.count().to_string()),
        ("current_playlist: description", playlist.description().to_string()),
        ("current_playlist: index", playlist.index().to_string()),
        ("current_playlist: playlist", playlist.playlist().to_string()),
        ("current_playlist: type", playlist.kind().to_string()),
        ("MQTT: configured", status.mqtt.configured().to_string()),
        ("MQTT: connected", status.mqtt.connected().to_string()),
        ("AdvView: HostName", adv.host_name().to_string()),
        ("AdvView: HostDescription", adv.host_description().to_string()),
        ("AdvView: Platform", adv.platform().to_string()),
        ("AdvView: Variant", adv.variant().to_string()),
        ("AdvView: Mode", adv.mode().to_string()),
        ("AdvView: Version", adv.version().to_string()),
        ("AdvView: Branch", adv.branch().to_string()),
        ("AdvView: OSVersion", adv.os_version().to_string()),
        ("AdvView: OSRelease", adv.os_release().to_string()),
        ("AdvView: channelRanges", adv.channel_ranges().to_string()),
        ("AdvView: majorVersion", adv.major_version().to_string()),
        ("AdvView: minorVersion", adv.minor_version().to_string()),
        ("AdvView: typeId", adv.type_id().to_string()),
        ("AdvView: Kernel", adv.kernel().to_string()),
        ("AdvView: LocalGitVersion", adv.local_git_version().to_string()),
        ("AdvView: RemoteGitVersion", adv.remote_git_version().to_string()),
        ("AdvView: UpgradeSource", adv.upgrade_source().to_string()),
        ("AdvView: IPs", adv.ips().join(", ")),
        ("AdvView: Utilization: CPU", format!("{:.2}%", util.cpu())),
        ("AdvView: Utilization: Memory", format!("{:.2}%", util.memory())),
        ("AdvView: Utilization: Uptime", util.uptime().to_string()),
        ("playlists: Names", device.playlist_names().join(", ")),
        ("sequences: Names", device.sequence_names().join(", ")),
    ];

    let rows: Vec<PropertyRow> = rows
        .into_iter()
        .map(|(property, value)| PropertyRow {
            property: property.to_string(),
            value,
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Table of discovered devices
pub fn render_devices(devices: &[DiscoveredDevice]) -> String {
    let rows: Vec<DeviceRow> = devices
        .iter()
        .map(|d| DeviceRow {
            name: d.name.clone(),
            addresses: d
                .addresses
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Bordered box with a title row above the message
pub fn render_panel(title: &str, message: &str) -> String {
    let mut builder = Builder::default();
    builder.push_record([message.to_string()]);

    let mut table = builder.build();
    table.with(Panel::header(title)).with(Style::rounded());
    table.to_string()
}

/// [`render_panel`] in red, printed to stderr
pub fn print_panel(title: &str, message: &str) {
    for line in render_panel(title, message).lines() {
        eprintln!("{}", line.red().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_has_title_above_message() {
        let panel = render_panel("Connection error", "Could not connect.\nfpp scan");
        let lines: Vec<&str> = panel.lines().collect();

        assert!(lines[0].starts_with('╭'), "{panel}");
        assert!(lines.last().unwrap().starts_with('╰'), "{panel}");

        let title = lines.iter().position(|l| l.contains("Connection error")).unwrap();
        let message = lines.iter().position(|l| l.contains("Could not connect.")).unwrap();
        assert!(title < message, "{panel}");
        assert!(panel.contains("fpp scan"));
    }
}
