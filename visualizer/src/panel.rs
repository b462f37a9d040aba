use crate::{Message, SettingToggle, VesselMap, PANEL_WIDTH};
use iced::widget::{button, column, row, scrollable, text, text_input, Column, Container, Row};
use iced::{Color, Element, Length};
use vesselcore::geo::{MeasurementSystem, RangeTimeframe};
use vesselcore::render::{build_table, SortOrder, TableColumn, TableRow};
use vesselcore::telemetry::FeedStatus;
use vesselcore::wire::VesselRecord;
use vesselcore::LabelMode;

const UNITS: [(MeasurementSystem, &str); 3] = [
    (MeasurementSystem::Nautical, "nmi"),
    (MeasurementSystem::Metric, "km"),
    (MeasurementSystem::Imperial, "mi"),
];

const LABELS: [(LabelMode, &str); 3] = [
    (LabelMode::Never, "Never"),
    (LabelMode::Dynamic, "Dynamic"),
    (LabelMode::Always, "Always"),
];

fn status_color(status: FeedStatus) -> Color {
    match status {
        FeedStatus::Unknown => Color::from_rgb(0.6, 0.6, 0.6),
        FeedStatus::Ok => Color::from_rgb(0.3, 0.85, 0.4),
        FeedStatus::Error => Color::from_rgb(0.95, 0.3, 0.3),
    }
}

/// Marks the active choice of a button group.
fn choice(label: &str, active: bool) -> String {
    if active {
        format!("[{}]", label)
    } else {
        label.to_string()
    }
}

fn on_off(label: &str, on: bool) -> String {
    format!("{}: {}", label, if on { "on" } else { "off" })
}

fn heading(title: &str) -> Element<'_, Message> {
    text(title).size(16).into()
}

fn status_bar(app: &VesselMap) -> Element<'_, Message> {
    let status = app.poll.metrics().status();
    let counts = app.poll.metrics().snapshot();
    row![
        text("\u{25cf}").color(status_color(status)),
        text(format!("{} vessels", app.scene.vessel_count)),
        text(format!("{} failed", counts.failed)).size(12),
    ]
    .spacing(8)
    .into()
}

fn notices(app: &VesselMap) -> Element<'_, Message> {
    Column::with_children(app.notices.iter().enumerate().map(|(index, notice)| {
        let color = if notice.is_error {
            Color::from_rgb(0.95, 0.4, 0.4)
        } else {
            Color::from_rgb(0.8, 0.8, 0.8)
        };
        row![
            text(notice.message.as_str()).size(12).color(color).width(Length::Fill),
            button(text("x").size(12)).on_press(Message::DismissNotice(index)),
        ]
        .spacing(6)
        .into()
    }))
    .spacing(4)
    .into()
}

fn card_lines(record: &VesselRecord, system: MeasurementSystem) -> Vec<String> {
    let mut lines = vec![
        format!("MMSI {}", record.mmsi),
        record.classification.shipclass.label().to_string(),
    ];
    if let Some(country) = &record.identity.country {
        lines.push(format!("Flag {}", country));
    }
    if let Some(callsign) = &record.identity.callsign {
        lines.push(format!("Callsign {}", callsign));
    }
    if let Some(destination) = &record.identity.destination {
        lines.push(format!("Destination {}", destination));
    }
    if record.identity.eta.is_known() {
        lines.push(format!("ETA {}", record.identity.eta.display()));
    }
    if let Some(kn) = record.kinematics.speed {
        lines.push(format!(
            "Speed {} {}",
            system.format_speed_kn(kn),
            system.speed_unit()
        ));
    }
    if let Some(nm) = record.distance {
        lines.push(format!(
            "Distance {} {}",
            system.format_distance_nm(nm),
            system.distance_unit()
        ));
    }
    if let Some(dims) = record.hull.dimensions() {
        lines.push(format!("Size {:.0} x {:.0} m", dims.length(), dims.beam()));
    }
    lines
}

fn vessel_card(app: &VesselMap) -> Option<Element<'_, Message>> {
    let mmsi = app.card?;
    let record = app.session.registry().get(mmsi)?;
    let system = app.session.settings().metric;

    let mut card = Column::new()
        .spacing(4)
        .push(row![
            text(record.display_name()).size(16).width(Length::Fill),
            button(text("x").size(12)).on_press(Message::Select(None)),
        ]);
    for line in card_lines(record, system) {
        card = card.push(text(line).size(12));
    }

    let mut actions = Row::new().spacing(6);
    if app.session.track_controls_enabled() {
        actions = actions.push(
            button(text(app.session.track_option_label(mmsi)).size(12))
                .on_press(Message::ToggleTrack(mmsi)),
        );
    }
    actions = actions.push(
        button(text("Measure from").size(12)).on_press(Message::MeasureFrom(mmsi)),
    );
    Some(card.push(actions).into())
}

fn tools(app: &VesselMap) -> Element<'_, Message> {
    let measuring = app.session.interaction().measure().is_active();
    let measure = if measuring {
        button(text("Cancel").size(12)).on_press(Message::CancelMeasurement)
    } else {
        button(text("Measure").size(12)).on_press(Message::StartMeasurement)
    };
    row![
        measure,
        button(text("All tracks").size(12)).on_press(Message::ShowAllTracks),
        button(text("Delete tracks").size(12)).on_press(Message::DeleteAllTracks),
    ]
    .spacing(6)
    .into()
}

fn measurements(app: &VesselMap) -> Element<'_, Message> {
    Column::with_children(app.scene.measurement_rows.iter().map(|entry| {
        let result = match (&entry.distance, &entry.bearing) {
            (Some(distance), Some(bearing)) => format!("{} {}", distance, bearing),
            _ => "-".to_string(),
        };
        row![
            text(format!("{} > {}  {}", entry.from, entry.to, result))
                .size(12)
                .width(Length::Fill),
            button(text(if entry.visible { "Hide" } else { "Show" }).size(12))
                .on_press(Message::ToggleMeasurement(entry.index)),
            button(text("x").size(12)).on_press(Message::RemoveMeasurement(entry.index)),
        ]
        .spacing(4)
        .into()
    }))
    .spacing(2)
    .into()
}

fn settings(app: &VesselMap) -> Element<'_, Message> {
    let view = app.session.settings();

    let units = Row::with_children(UNITS.iter().map(|(system, label)| {
        button(text(choice(label, view.metric == *system)).size(12))
            .on_press(Message::Units(*system))
            .into()
    }))
    .spacing(4);

    let labels = Row::with_children(LABELS.iter().map(|(mode, label)| {
        button(text(choice(label, view.show_labels == *mode)).size(12))
            .on_press(Message::Labels(*mode))
            .into()
    }))
    .spacing(4);

    let toggles = [
        ("Track on hover", SettingToggle::TrackOnHover, view.show_track_on_hover),
        ("Track on select", SettingToggle::TrackOnSelect, view.show_track_on_select),
        ("Fading", SettingToggle::Fading, view.fading),
        ("Distance circles", SettingToggle::DistanceCircles, view.distance_circles),
        ("Circle outlines", SettingToggle::CircleOutline, view.show_circle_outline),
        ("Short range", SettingToggle::ShortRange, view.show_short_range),
    ];
    let toggles = Column::with_children(toggles.into_iter().map(|(label, toggle, on)| {
        button(text(on_off(label, on)).size(12))
            .on_press(Message::Toggle(toggle))
            .into()
    }))
    .spacing(2);

    let mut range = Row::new().spacing(4).push(
        button(text(on_off("Range", view.show_range)).size(12)).on_press(Message::ToggleRange),
    );
    for timeframe in RangeTimeframe::ALL {
        range = range.push(
            button(text(choice(timeframe.label(), view.range_timeframe == timeframe)).size(12))
                .on_press(Message::Timeframe(timeframe)),
        );
    }

    column![units, labels, range, toggles].spacing(6).into()
}

fn header_title(column: TableColumn, active: TableColumn, ascending: bool) -> String {
    if column == active {
        format!("{} {}", column.title(), if ascending { "^" } else { "v" })
    } else {
        column.title().to_string()
    }
}

fn table_row(entry: TableRow) -> Element<'static, Message> {
    let cell = |value: Option<String>| text(value.unwrap_or_default()).size(12);
    button(
        row![
            cell(entry.country).width(Length::Fixed(36.0)),
            text(entry.name).size(12).width(Length::Fill),
            cell(entry.distance).width(Length::Fixed(56.0)),
            cell(entry.speed).width(Length::Fixed(44.0)),
            cell(entry.last_signal).width(Length::Fixed(44.0)),
        ]
        .spacing(4),
    )
    .width(Length::Fill)
    .on_press(Message::Focus(entry.mmsi))
    .into()
}

fn table(app: &VesselMap) -> Element<'_, Message> {
    let view = app.session.settings();
    let ascending = view.table_order == SortOrder::Ascending;

    let header = Row::with_children(TableColumn::ALL.iter().map(|column| {
        button(text(header_title(*column, view.table_column, ascending)).size(12))
            .on_press(Message::SortBy(*column))
            .into()
    }))
    .spacing(2);

    let rows = build_table(
        app.session.registry(),
        view.table_column,
        view.table_order,
        &app.search,
        view.metric,
    );
    let rows = Column::with_children(rows.into_iter().map(table_row)).spacing(2);

    column![
        text_input("Search vessels", &app.search).on_input(Message::Search),
        header,
        scrollable(rows).height(Length::Fill),
    ]
    .spacing(6)
    .into()
}

/// Status, vessel card, tools, measurements, settings and the vessel table.
pub fn side_panel(app: &VesselMap) -> Element<'_, Message> {
    let mut content = Column::new()
        .spacing(12)
        .push(status_bar(app))
        .push(notices(app));
    if let Some(card) = vessel_card(app) {
        content = content.push(card);
    }
    content = content.push(tools(app));
    if !app.scene.measurement_rows.is_empty() {
        content = content
            .push(heading("Measurements"))
            .push(measurements(app));
    }
    content = content
        .push(heading("Settings"))
        .push(settings(app))
        .push(heading("Vessels"))
        .push(table(app));

    Container::new(content)
        .padding(10)
        .width(Length::Fixed(PANEL_WIDTH))
        .height(Length::Fill)
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesselcore::wire::{Eta, ShipClass};

    #[test]
    fn button_groups_mark_the_active_choice() {
        assert_eq!(choice("km", true), "[km]");
        assert_eq!(choice("km", false), "km");
        assert_eq!(on_off("Fading", false), "Fading: off");
        assert_eq!(
            header_title(TableColumn::Speed, TableColumn::Speed, false),
            "Speed v"
        );
        assert_eq!(
            header_title(TableColumn::Flag, TableColumn::Speed, true),
            "Flag"
        );
    }

    #[test]
    fn card_lists_only_known_fields() {
        let mut record = VesselRecord::new(244_000_001);
        record.classification.shipclass = ShipClass::Cargo;
        record.kinematics.speed = Some(10.0);
        record.identity.eta = Eta {
            month: Some(3),
            day: Some(14),
            hour: None,
            minute: None,
        };
        let lines = card_lines(&record, MeasurementSystem::Metric);
        assert_eq!(lines[0], "MMSI 244000001");
        assert!(lines.contains(&"Speed 18.5 km/h".to_string()));
        assert!(lines.contains(&"ETA 03-14 --:--".to_string()));
        assert!(!lines.iter().any(|line| line.starts_with("Distance")));
    }
}
