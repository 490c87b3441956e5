use chrono::{NaiveDate, NaiveDateTime, Timelike};
use egui::{Color32, RichText, Ui};

use crate::api::ClientDto;
use crate::config::{ClockFormat, Config};
use crate::layout::{
    format_time, format_time_24, hour_label, layout_board, now_indicator_top, BoxedTask, LayoutMode,
    LayoutParams,
};
use crate::roster::{Roster, Task};
use crate::selection::Selection;
use super::theme;

/// Sidebar clicks
#[derive(Default)]
pub struct SidebarResult {
    pub select_department: Option<String>,
    pub select_employee: Option<(String, String)>,  // (department id, employee id)
}

/// Result from board interactions
#[derive(Default)]
pub struct BoardResult {
    pub edit_task: Option<Task>,
    pub delete_task: Option<Task>,
    pub add_at: Option<(NaiveDate, String, Option<String>)>,  // (date, start time, employee id)
}

/// Departments with their employees, collapsible
pub fn render_sidebar(ui: &mut Ui, roster: &Roster, selection: &Selection) -> SidebarResult {
    let mut result = SidebarResult::default();

    egui::ScrollArea::vertical().show(ui, |ui| {
        for department in &roster.departments {
            let department_selected = selection.department_id.as_deref() == Some(department.id.as_str())
                && selection.employee_id.is_none();

            let header = RichText::new(format!("{} {}", egui_phosphor::regular::USERS, department.name));
            let header = if department_selected { header.strong().color(theme::accent()) } else { header };

            let response = egui::CollapsingHeader::new(header)
                .id_salt(("department", &department.id))
                .show(ui, |ui| {
                    if department.employees.is_empty() {
                        ui.label(RichText::new("No employees").color(theme::muted_text()).small());
                    }
                    for employee in &department.employees {
                        let selected = selection.employee_id.as_deref() == Some(employee.id.as_str());
                        let label = ui.horizontal(|ui| {
                            let icon = if selected {
                                RichText::new(egui_phosphor::fill::USER_CIRCLE)
                                    .family(theme::phosphor_fill_family())
                                    .color(theme::accent())
                            } else {
                                RichText::new(egui_phosphor::regular::USER_CIRCLE).color(theme::muted_text())
                            };
                            ui.label(icon.size(18.0));
                            ui.selectable_label(
                                selected,
                                RichText::new(format!("{}\n{}", employee.name, employee.position)),
                            )
                        }).inner;
                        if label.clicked() {
                            result.select_employee = Some((department.id.clone(), employee.id.clone()));
                        }
                    }
                });

            if response.header_response.clicked() {
                result.select_department = Some(department.id.clone());
            }
        }
    });

    result
}

fn clock_label(minutes: u32, clock_format: ClockFormat) -> String {
    match clock_format {
        ClockFormat::Hour12 => format_time(minutes),
        ClockFormat::Hour24 => format_time_24(minutes),
    }
}

fn axis_label(hour: u32, clock_format: ClockFormat) -> String {
    match clock_format {
        ClockFormat::Hour12 => hour_label(hour),
        ClockFormat::Hour24 => format!("{:02}:00", hour),
    }
}

/// Render the timeline board for the current selection
pub fn render_board(
    ui: &mut Ui,
    roster: &Roster,
    selection: &Selection,
    config: &Config,
    now: NaiveDateTime,
) -> BoardResult {
    let mut result = BoardResult::default();
    let mode = selection.mode();
    let lanes = mode.lanes(roster, selection);

    if lanes.iter().all(|lane| lane.tasks.is_empty()) && mode == LayoutMode::SingleDay {
        let message = empty_day_message(selection, now.date());
        ui.add_space(40.0);
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(message).color(theme::muted_text()));
        });
        return result;
    }

    // Layout constants
    let hour_label_width = 64.0;
    let header_height = 32.0;
    let min_lane_width = 180.0;
    let (hour_line_color, quarter_line_color, lane_line_color) = theme::grid_colors();

    let available_width = ui.available_width();
    let lane_width = ((available_width - hour_label_width) / lanes.len().max(1) as f32).max(min_lane_width);
    let params = LayoutParams {
        window: config.layout_window(),
        pixels_per_minute: config.pixels_per_minute(),
        lane_width,
        min_box_height: config.min_box_height,
        default_duration: config.default_duration_minutes(),
    };
    let board_width = hour_label_width + lane_width * lanes.len() as f32;
    let board_height = params.board_height();

    egui::ScrollArea::both().show(ui, |ui| {
        // Lane headers
        let (header_rect, _) = ui.allocate_exact_size(egui::vec2(board_width, header_height), egui::Sense::hover());
        for (i, lane) in lanes.iter().enumerate() {
            let rect = egui::Rect::from_min_size(
                egui::pos2(header_rect.min.x + hour_label_width + i as f32 * lane_width, header_rect.min.y),
                egui::vec2(lane_width, header_height),
            );
            let highlighted = mode == LayoutMode::WeekGrid && lane.date == now.date();
            if highlighted {
                ui.painter().rect_filled(rect, 4.0, theme::accent().gamma_multiply(0.12));
            }
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                &lane.label,
                egui::FontId::proportional(14.0),
                ui.visuals().text_color(),
            );
        }

        let (grid_rect, _) = ui.allocate_exact_size(egui::vec2(board_width, board_height), egui::Sense::hover());
        let lanes_left = grid_rect.min.x + hour_label_width;
        let painter = ui.painter().clone();

        // Hour labels and horizontal grid lines
        let hour_height = 60.0 * params.pixels_per_minute;
        for (i, hour) in params.window.hours().enumerate() {
            let y = grid_rect.min.y + i as f32 * hour_height;
            painter.text(
                egui::pos2(lanes_left - 8.0, y + 2.0),
                egui::Align2::RIGHT_TOP,
                axis_label(hour, config.clock_format),
                egui::FontId::proportional(11.0),
                theme::muted_text(),
            );
            painter.line_segment(
                [egui::pos2(lanes_left, y), egui::pos2(grid_rect.max.x, y)],
                egui::Stroke::new(1.0, hour_line_color),
            );
            for quarter in 1..4 {
                let qy = y + quarter as f32 * hour_height / 4.0;
                painter.line_segment(
                    [egui::pos2(lanes_left, qy), egui::pos2(grid_rect.max.x, qy)],
                    egui::Stroke::new(1.0, quarter_line_color),
                );
            }
        }

        // Lane separators, plus double-click on empty space to add a task there
        for (i, lane) in lanes.iter().enumerate() {
            let x = lanes_left + i as f32 * lane_width;
            painter.line_segment(
                [egui::pos2(x, grid_rect.min.y), egui::pos2(x, grid_rect.max.y)],
                egui::Stroke::new(1.0, lane_line_color),
            );

            let lane_rect = egui::Rect::from_min_size(
                egui::pos2(x, grid_rect.min.y),
                egui::vec2(lane_width, board_height),
            );
            let lane_response = ui.interact(lane_rect, ui.id().with(("lane", i)), egui::Sense::click());
            if lane_response.double_clicked() {
                if let Some(pos) = lane_response.interact_pointer_pos() {
                    let offset_minutes = ((pos.y - grid_rect.min.y) / params.pixels_per_minute).max(0.0) as u32;
                    let slot = config.slot_minutes();
                    let snapped = params.window.start + offset_minutes / slot * slot;
                    result.add_at = Some((lane.date, format_time(snapped), lane.employee_id.clone()));
                }
            }
        }

        // Task boxes
        for boxed in layout_board(&lanes, &params) {
            let rect = egui::Rect::from_min_size(
                egui::pos2(lanes_left + boxed.left + 2.0, grid_rect.min.y + boxed.top + 1.0),
                egui::vec2((boxed.width - 4.0).max(8.0), (boxed.height - 2.0).max(8.0)),
            );
            paint_task_box(&painter, rect, &boxed, config.clock_format);

            let response = ui
                .interact(rect, ui.id().with(("task", boxed.lane_index, &boxed.task.id)), egui::Sense::click())
                .on_hover_text(task_tooltip(boxed.task));
            if response.clicked() {
                result.edit_task = Some(boxed.task.clone());
            }
            response.context_menu(|ui| {
                if ui.button(format!("{} Edit", egui_phosphor::regular::PENCIL_SIMPLE)).clicked() {
                    result.edit_task = Some(boxed.task.clone());
                    ui.close_menu();
                }
                if ui.button(format!("{} Delete", egui_phosphor::regular::TRASH)).clicked() {
                    result.delete_task = Some(boxed.task.clone());
                    ui.close_menu();
                }
            });
        }

        // Current time line, only when today is on the board
        if lanes.iter().any(|lane| lane.date == now.date()) {
            let top = now_indicator_top(now.time(), params.window.start, params.pixels_per_minute);
            if top <= board_height {
                let y = grid_rect.min.y + top;
                let color = theme::now_line_color();
                painter.circle_filled(egui::pos2(lanes_left - 4.0, y), 4.0, color);
                painter.line_segment(
                    [egui::pos2(lanes_left, y), egui::pos2(grid_rect.max.x, y)],
                    egui::Stroke::new(2.0, color),
                );
            }
        }
    });

    if mode == LayoutMode::WeekGrid && lanes.iter().all(|lane| lane.tasks.is_empty()) {
        ui.label(RichText::new("No tasks scheduled for this week").color(theme::muted_text()));
    }

    result
}

/// Empty-state text for the day view, naming the day actually shown
fn empty_day_message(selection: &Selection, today: NaiveDate) -> String {
    if selection.department_id.is_none() {
        "Pick a department or an employee from the sidebar".to_string()
    } else if selection.date == today {
        "No tasks scheduled for today".to_string()
    } else {
        format!("No tasks scheduled for {}", selection.date.format("%A, %B %-d"))
    }
}

fn task_tooltip(task: &Task) -> String {
    let mut text = task.title.clone();
    if let Some(name) = &task.employee_name {
        text.push_str(&format!("\n{}", name));
    }
    match &task.end_time {
        Some(end) => text.push_str(&format!("\n{} - {}", task.time, end)),
        None => text.push_str(&format!("\n{}", task.time)),
    }
    if !task.description.is_empty() {
        text.push_str(&format!("\n\n{}", task.description));
    }
    text
}

/// Paint one task box (interaction is handled by the caller)
fn paint_task_box(painter: &egui::Painter, rect: egui::Rect, boxed: &BoxedTask<'_>, clock_format: ClockFormat) {
    let (fill, accent_color) = theme::task_colors(boxed.task.color);
    let corner_radius = 4.0;

    painter.rect(rect, corner_radius, fill, egui::Stroke::new(1.0, accent_color.gamma_multiply(0.5)));

    // Left accent stripe
    let accent_width = 3.0;
    painter.rect(
        egui::Rect::from_min_size(rect.min, egui::vec2(accent_width, rect.height())),
        egui::Rounding {
            nw: corner_radius,
            sw: corner_radius,
            ne: 0.0,
            se: 0.0,
        },
        accent_color,
        egui::Stroke::NONE,
    );

    let text_left = rect.min.x + accent_width + 6.0;
    let max_width = (rect.max.x - text_left - 4.0).max(0.0);
    let clip = painter.with_clip_rect(rect);
    let text_color = Color32::from_rgb(17, 24, 39);

    let title = clip.layout(
        boxed.task.title.clone(),
        egui::FontId::proportional(13.0),
        text_color,
        max_width,
    );
    let title_height = title.size().y;
    clip.galley(egui::pos2(text_left, rect.min.y + 4.0), title, text_color);

    let start = crate::layout::parse_time(&boxed.task.time);
    let mut subtitle = clock_label(start, clock_format);
    if let Some(name) = &boxed.task.employee_name {
        if boxed.column_count == 1 {
            subtitle = format!("{}  {}", subtitle, name);
        }
    }
    if rect.height() > title_height + 20.0 {
        clip.text(
            egui::pos2(text_left, rect.min.y + 6.0 + title_height),
            egui::Align2::LEFT_TOP,
            subtitle,
            egui::FontId::proportional(11.0),
            theme::muted_text(),
        );
    }
}

/// Client list clicks
#[derive(Default)]
pub struct ClientsResult {
    pub add: bool,
    pub reload: bool,
    pub edit: Option<ClientDto>,
    pub delete: Option<ClientDto>,
}

/// Client registry: one row per client with edit and delete actions
pub fn render_clients(ui: &mut Ui, clients: &[ClientDto], loaded: bool) -> ClientsResult {
    let mut result = ClientsResult::default();

    ui.horizontal(|ui| {
        ui.heading("Clients");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button(format!("{} Add client", egui_phosphor::regular::PLUS)).clicked() {
                result.add = true;
            }
            if ui.button(egui_phosphor::regular::ARROWS_CLOCKWISE).on_hover_text("Reload").clicked() {
                result.reload = true;
            }
        });
    });
    ui.separator();

    if !loaded {
        return result;
    }
    if clients.is_empty() {
        ui.add_space(40.0);
        ui.vertical_centered(|ui| {
            ui.label(RichText::new("No clients found").color(theme::muted_text()));
        });
        return result;
    }

    let row_fill = ui.visuals().faint_bg_color;
    egui::ScrollArea::vertical().show(ui, |ui| {
        for client in clients {
            egui::Frame::none()
                .fill(row_fill)
                .rounding(egui::Rounding::same(6.0))
                .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(&client.name).strong());
                        if !client.client_code.is_empty() {
                            ui.label(RichText::new(&client.client_code).color(theme::muted_text()));
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let delete = ui.add(egui::Label::new(
                                RichText::new(egui_phosphor::regular::X).color(theme::muted_text())
                            ).sense(egui::Sense::click()));
                            if delete.on_hover_text("Delete").clicked() {
                                result.delete = Some(client.clone());
                            }
                            let edit = ui.add(egui::Label::new(
                                RichText::new(egui_phosphor::regular::PENCIL_SIMPLE).color(theme::muted_text())
                            ).sense(egui::Sense::click()));
                            if edit.on_hover_text("Edit").clicked() {
                                result.edit = Some(client.clone());
                            }
                        });
                    });
                });
            ui.add_space(4.0);
        }
    });

    result
}

/// Header line: "Sales - Today's Tasks" plus the date or week range
pub fn board_title(roster: &Roster, selection: &Selection) -> (String, String) {
    let department = selection
        .department_id
        .as_deref()
        .and_then(|id| roster.department(id));

    let title = match (department, selection.employee_id.as_deref()) {
        (Some(dept), Some(employee_id)) => match dept.employee(employee_id) {
            Some(employee) => format!("{} - {}", dept.name, employee.name),
            None => dept.name.clone(),
        },
        (Some(dept), None) => format!("{} - Today's Tasks", dept.name),
        (None, _) => "All Tasks".to_string(),
    };

    let days = selection.visible_days();
    let subtitle = match (days.first(), days.last()) {
        (Some(first), Some(last)) if days.len() > 1 => {
            format!("{} - {}", first.format("%b %-d"), last.format("%b %-d, %Y"))
        }
        _ => selection.date.format("%A, %B %-d, %Y").to_string(),
    };

    (title, subtitle)
}

/// Wall-clock minutes for a timestamp, for seeding the add dialog
pub fn minutes_of(now: NaiveDateTime) -> u32 {
    now.hour() * 60 + now.minute()
}
