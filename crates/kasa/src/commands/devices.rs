//! Device command handlers.

use serde::Serialize;
use tabled::Tabled;

use kasa_api::{Device, PreferredState, Session};

use crate::cli::{DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

// ── Views ───────────────────────────────────────────────────────────

/// Serializable snapshot of a bulb for JSON output.
#[derive(Debug, Serialize)]
struct DeviceView<'a> {
    alias: &'a str,
    id: &'a str,
    on: bool,
    status: i64,
    brightness: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    return_brightness: Option<i64>,
    model: &'a str,
    name: &'a str,
    device_type: &'a str,
    mac: &'a str,
    firmware_version: &'a str,
    role: &'a str,
    app_server_url: &'a str,
    preferred_states: &'a [PreferredState],
}

impl<'a> From<&'a Device> for DeviceView<'a> {
    fn from(d: &'a Device) -> Self {
        Self {
            alias: d.alias(),
            id: d.id(),
            on: d.is_connected(),
            status: d.status(),
            brightness: d.brightness(),
            return_brightness: d.return_brightness(),
            model: d.model(),
            name: d.name(),
            device_type: d.device_type(),
            mac: d.mac(),
            firmware_version: d.firmware_version(),
            role: d.role(),
            app_server_url: d.app_server_url(),
            preferred_states: d.preferred_states(),
        }
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Alias")]
    alias: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Brightness")]
    brightness: String,
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Presets")]
    presets: usize,
    #[tabled(rename = "ID")]
    id: String,
}

fn row(v: &DeviceView<'_>, color: bool) -> DeviceRow {
    DeviceRow {
        alias: v.alias.to_owned(),
        state: output::power_label(v.on, color),
        brightness: format!("{}%", v.brightness),
        model: v.model.to_owned(),
        presets: v.preferred_states.len(),
        id: v.id.to_owned(),
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn detail(v: &DeviceView<'_>, color: bool) -> String {
    let mut lines = vec![
        format!("Alias:      {}", v.alias),
        format!("State:      {}", output::power_label(v.on, color)),
        format!("Brightness: {}%", v.brightness),
        format!("ID:         {}", or_dash(v.id)),
        format!("Model:      {}", or_dash(v.model)),
        format!("Name:       {}", or_dash(v.name)),
        format!("Type:       {}", or_dash(v.device_type)),
        format!("MAC:        {}", or_dash(v.mac)),
        format!("Firmware:   {}", or_dash(v.firmware_version)),
        format!("Role:       {}", or_dash(v.role)),
        format!("Gateway:    {}", or_dash(v.app_server_url)),
    ];
    if let (false, Some(level)) = (v.on, v.return_brightness) {
        lines.insert(3, format!("Turns on:   {level}%"));
    }
    if v.preferred_states.is_empty() {
        lines.push("Presets:    -".into());
    } else {
        lines.push("Presets:".into());
        for (position, preset) in v.preferred_states.iter().enumerate() {
            let s = &preset.settings;
            lines.push(format!(
                "  [{position}] brightness {}%  color_temp {}  hue {}  saturation {}",
                s.brightness, s.color_temp, s.hue, s.saturation
            ));
        }
    }
    lines.join("\n")
}

fn find<'s>(session: &'s mut Session, alias: &str) -> Result<&'s mut Device, CliError> {
    session
        .find_device_mut(alias)
        .ok_or_else(|| CliError::NotFound {
            alias: alias.to_owned(),
        })
}

fn print_device(device: &Device, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &DeviceView::from(device),
        |v| detail(v, color),
        |v| v.alias.to_owned(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_state(device: &Device, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(
        &global.output,
        &DeviceView::from(device),
        |_| device.human_name(),
        |_| device.human_name(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &mut Session,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    session.list_devices().await?;

    match args.command {
        DevicesCommand::List => {
            let color = output::should_color(&global.color);
            let views: Vec<DeviceView<'_>> = session.devices().iter().map(DeviceView::from).collect();
            let out = output::render_list(
                &global.output,
                &views,
                |v| row(v, color),
                |v| v.alias.to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Info { alias } => {
            let device = find(session, &alias)?;
            print_device(device, global)
        }

        DevicesCommand::On { alias } => {
            let device = find(session, &alias)?;
            device.turn_on().await?;
            print_state(device, global)
        }

        DevicesCommand::Off { alias } => {
            let device = find(session, &alias)?;
            device.turn_off().await?;
            print_state(device, global)
        }

        DevicesCommand::Preset { alias, index } => {
            let device = find(session, &alias)?;
            device.apply_preferred_state(index).await?;
            print_state(device, global)
        }
    }
}
