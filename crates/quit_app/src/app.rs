use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use egui::{Align, Color32, Layout, RichText, ScrollArea, Sense};
use quit_core::{
    calendar::Field,
    clock::{Clock, SystemClock},
    item::{BenefitKind, QuitItem},
    picker::{DatePicker, PickerConfig},
    storage::JsonFileStorage,
    store::{QuitStatus, QuitStore, DEFAULT_STORAGE_KEY},
    wheel::WheelRow,
    QuitForm,
};
use tracing::{debug, info, warn};

const WHEEL_WIDTH: f32 = 64.0;
const SNAP_ANIMATION: Duration = Duration::from_millis(300);

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) storage_key: String,
    pub(crate) picker_years: i32,
    pub(crate) include_time: bool,
    pub(crate) tick: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("QUIT_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(key) = std::env::var("QUIT_STORAGE_KEY") {
            if !key.trim().is_empty() {
                config.storage_key = key.trim().to_string();
            }
        }
        if let Ok(years) = std::env::var("QUIT_PICKER_YEARS") {
            if let Ok(value) = years.trim().parse::<i32>() {
                if value > 0 {
                    config.picker_years = value;
                }
            }
        }
        if let Ok(flag) = std::env::var("QUIT_INCLUDE_TIME") {
            if let Some(value) = parse_flag(&flag) {
                config.include_time = value;
            }
        }
        if let Ok(tick) = std::env::var("QUIT_TICK_MS") {
            if let Ok(value) = tick.trim().parse::<u64>() {
                if value > 0 {
                    config.tick = Duration::from_millis(value);
                }
            }
        }
        Ok(config)
    }

    pub(crate) fn picker_config(&self) -> PickerConfig {
        PickerConfig {
            year_span: self.picker_years,
            ..PickerConfig::default()
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".quit-toxic"),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            picker_years: 10,
            include_time: true,
            tick: Duration::from_millis(1000),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Host-side interpolation of an animated snap.
#[derive(Clone, Copy, Debug)]
struct WheelAnimation {
    from: f32,
    to: f32,
    started: Instant,
}

impl WheelAnimation {
    fn offset_at(&self, now: Instant) -> (f32, bool) {
        let t = (now.saturating_duration_since(self.started).as_secs_f32()
            / SNAP_ANIMATION.as_secs_f32())
        .clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - t).powi(3);
        (self.from + (self.to - self.from) * eased, t >= 1.0)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct WheelView {
    rendered_offset: f32,
    pointer_held: bool,
    animation: Option<WheelAnimation>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PickerAction {
    Confirm,
    Cancel,
}

struct QuitAppController {
    config: AppConfig,
    store: QuitStore,
    clock: Box<dyn Clock>,
    form: QuitForm,
    form_open: bool,
    delete_confirm: Option<QuitItem>,
    statuses: Vec<QuitStatus>,
    wheel_views: HashMap<Field, WheelView>,
    next_tick: Instant,
    status_message: Option<String>,
}

impl QuitAppController {
    fn new(config: AppConfig) -> Result<Self> {
        info!(
            data_dir = %config.data_dir.display(),
            key = %config.storage_key,
            "initializing controller"
        );
        let store = QuitStore::builder()
            .storage_key(config.storage_key.clone())
            .with_storage(Box::new(JsonFileStorage::new(&config.data_dir)))
            .build()
            .context("failed to load quit items")?;

        let mut controller = Self {
            form: QuitForm::new(config.include_time),
            config,
            store,
            clock: Box::new(SystemClock),
            form_open: false,
            delete_confirm: None,
            statuses: Vec::new(),
            wheel_views: HashMap::new(),
            next_tick: Instant::now(),
            status_message: None,
        };
        controller.refresh_statuses();
        Ok(controller)
    }

    fn refresh_statuses(&mut self) {
        self.statuses = self.store.statuses(self.clock.now());
    }

    fn tick(&mut self, now: Instant) {
        if now >= self.next_tick {
            self.refresh_statuses();
            self.next_tick = now + self.config.tick;
        }
        if let Some(picker) = self.form.picker_mut() {
            if picker.tick(now) {
                debug!(value = %picker.value(), "picker settled");
            }
        }
    }

    fn next_wake(&self, now: Instant) -> Duration {
        let until_tick = self.next_tick.saturating_duration_since(now);
        match self.form.picker() {
            Some(picker) => picker.poll_timeout(now, until_tick),
            None => until_tick,
        }
    }

    fn start_new(&mut self) {
        self.form.start_new();
        self.form_open = true;
    }

    fn start_edit(&mut self, item: &QuitItem) {
        self.form.start_edit(item);
        self.form_open = true;
    }

    fn close_form(&mut self) {
        self.form.start_new();
        self.form_open = false;
        self.wheel_views.clear();
    }

    fn open_picker(&mut self) {
        self.wheel_views.clear();
        self.form
            .open_date_picker(self.clock.bound(), self.config.picker_config());
    }

    fn finish_picker(&mut self, action: PickerAction) {
        match action {
            PickerAction::Confirm => {
                self.form.confirm_date_picker();
            }
            PickerAction::Cancel => self.form.cancel_date_picker(),
        }
        self.wheel_views.clear();
    }

    fn submit_form(&mut self) -> Result<()> {
        let start = Instant::now();
        let item = self
            .form
            .submit(&self.store, self.clock.now())
            .context("unable to save quit")?;
        self.form_open = false;
        self.refresh_statuses();
        info!(id = %item.id, elapsed_ms = %start.elapsed().as_millis(), "quit saved");
        self.set_status(format!("Saved \"{}\"", item.name));
        Ok(())
    }

    fn delete_item(&mut self, id: &str) -> Result<()> {
        let start = Instant::now();
        let removed = self
            .store
            .delete_item(id)
            .with_context(|| format!("unable to delete quit {id}"))?;
        self.refresh_statuses();
        info!(id, elapsed_ms = %start.elapsed().as_millis(), "quit deleted");
        self.set_status(format!("Deleted \"{}\"", removed.name));
        Ok(())
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    fn show_list(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Quit Toxic");
            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if ui.button("Add New Quit").clicked() {
                    self.start_new();
                }
            });
        });
        if let Some(message) = &self.status_message {
            ui.label(RichText::new(message).small().weak());
        }
        ui.separator();

        if self.statuses.is_empty() {
            ui.label("Nothing tracked yet. Add the first habit you quit.");
            return;
        }

        let mut edit: Option<QuitItem> = None;
        let mut delete: Option<QuitItem> = None;
        ScrollArea::vertical()
            .id_salt("quit_list")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for status in &self.statuses {
                    ui.group(|ui| {
                        ui.set_width(ui.available_width());
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(&status.item.name).heading().strong());
                            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                                if ui.small_button("Delete").clicked() {
                                    delete = Some(status.item.clone());
                                }
                                if ui.small_button("Edit").clicked() {
                                    edit = Some(status.item.clone());
                                }
                            });
                        });
                        if let Some(description) = &status.item.description {
                            ui.label(RichText::new(description).weak());
                        }
                        ui.label(RichText::new(status.elapsed_label()).size(22.0).strong());
                        if let Some(days) = status.days_clean_label() {
                            ui.label(days);
                        }
                        ui.label(RichText::new(status.since_label()).small());
                        if let Some(benefit) = &status.benefit {
                            ui.separator();
                            let color = match benefit.kind {
                                BenefitKind::Time => Color32::from_rgb(96, 165, 250),
                                BenefitKind::Money => Color32::from_rgb(74, 222, 128),
                            };
                            ui.label(benefit.kind.label());
                            ui.label(RichText::new(&benefit.display).size(18.0).color(color));
                            ui.label(RichText::new(benefit.daily_label()).small().weak());
                        }
                    });
                    ui.add_space(6.0);
                }
            });

        if let Some(item) = edit {
            self.start_edit(&item);
        }
        if let Some(item) = delete {
            self.delete_confirm = Some(item);
        }
    }

    fn show_form(&mut self, ctx: &egui::Context) {
        if !self.form_open {
            return;
        }
        let mut open = true;
        let mut save = false;
        let mut cancel = false;
        let mut pick_date = false;

        egui::Window::new(self.form.title())
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("Name *");
                ui.add(
                    egui::TextEdit::singleline(&mut self.form.name)
                        .hint_text("e.g., Smoking, Social Media, Coffee..."),
                );
                ui.label("Description (optional)");
                ui.add(
                    egui::TextEdit::multiline(&mut self.form.description)
                        .desired_rows(3)
                        .hint_text("Why did you quit? What motivated you?"),
                );
                ui.label("Quit Date");
                if ui.button(self.form.quit_date_label()).clicked() {
                    pick_date = true;
                }

                let mut benefit = self.form.benefit_type();
                egui::ComboBox::from_label("Benefit")
                    .selected_text(benefit.map(BenefitKind::label).unwrap_or("None"))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut benefit, None, "None");
                        ui.selectable_value(
                            &mut benefit,
                            Some(BenefitKind::Time),
                            BenefitKind::Time.label(),
                        );
                        ui.selectable_value(
                            &mut benefit,
                            Some(BenefitKind::Money),
                            BenefitKind::Money.label(),
                        );
                    });
                if benefit != self.form.benefit_type() {
                    self.form.set_benefit_type(benefit);
                }
                if let Some(kind) = self.form.benefit_type() {
                    let hint = match kind {
                        BenefitKind::Time => "Minutes per day",
                        BenefitKind::Money => "Amount per day",
                    };
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.form.benefit_amount)
                                .desired_width(120.0)
                                .hint_text(hint),
                        );
                        ui.add(
                            egui::TextEdit::singleline(&mut self.form.benefit_unit)
                                .desired_width(80.0),
                        );
                    });
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        cancel = true;
                    }
                    if ui.button("Save").clicked() {
                        save = true;
                    }
                });
            });

        if pick_date && self.form.picker().is_none() {
            self.open_picker();
        }
        if save {
            if let Err(err) = self.submit_form() {
                warn!(error = %format!("{err:#}"), "form submit failed");
                self.set_status(format!("{err:#}"));
            }
        }
        if cancel || !open {
            self.close_form();
        }
    }

    fn show_delete_confirmation(&mut self, ctx: &egui::Context) {
        let Some(item) = self.delete_confirm.clone() else {
            return;
        };
        let mut decision: Option<bool> = None;
        egui::Window::new("Delete Quit")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!(
                    "Delete \"{}\"? This cannot be undone.",
                    item.name
                ));
                ui.horizontal(|ui| {
                    if ui.button("Cancel").clicked() {
                        decision = Some(false);
                    }
                    if ui.button("Delete").clicked() {
                        decision = Some(true);
                    }
                });
            });

        match decision {
            Some(true) => {
                self.delete_confirm = None;
                if let Err(err) = self.delete_item(&item.id) {
                    warn!(error = %format!("{err:#}"), "delete failed");
                    self.set_status(format!("{err:#}"));
                }
            }
            Some(false) => self.delete_confirm = None,
            None => {}
        }
    }

    fn show_picker(&mut self, ctx: &egui::Context, now: Instant) {
        let Some(picker) = self.form.picker_mut() else {
            return;
        };
        let action = show_picker_window(ctx, picker, &mut self.wheel_views, now);
        if let Some(action) = action {
            self.finish_picker(action);
        }
    }
}

impl eframe::App for QuitAppController {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.tick(now);

        egui::CentralPanel::default().show(ctx, |ui| self.show_list(ui));
        self.show_form(ctx);
        self.show_picker(ctx, now);
        self.show_delete_confirmation(ctx);

        let animating = self
            .wheel_views
            .values()
            .any(|view| view.animation.is_some() || view.pointer_held);
        if animating {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(self.next_wake(Instant::now()));
        }
    }
}

fn show_picker_window(
    ctx: &egui::Context,
    picker: &mut DatePicker,
    views: &mut HashMap<Field, WheelView>,
    now: Instant,
) -> Option<PickerAction> {
    let mut action = None;
    let mut open = true;
    egui::Window::new(picker_title(picker.include_time()))
        .collapsible(false)
        .resizable(false)
        .open(&mut open)
        .show(ctx, |ui| {
            ui.label(RichText::new(picker.selection_label()).strong());
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                for field in picker.fields() {
                    ui.vertical(|ui| {
                        ui.label(RichText::new(field.label()).small().weak());
                        let view = views.entry(field).or_default();
                        show_wheel(ui, picker, field, view, now);
                    });
                }
            });
            ui.separator();
            show_calendar(ui, picker);
            ui.separator();
            ui.horizontal(|ui| {
                if ui.button("Cancel").clicked() {
                    action = Some(PickerAction::Cancel);
                }
                if ui.button("Confirm").clicked() {
                    action = Some(PickerAction::Confirm);
                }
            });
        });
    if !open {
        action = Some(PickerAction::Cancel);
    }
    action
}

fn picker_title(include_time: bool) -> &'static str {
    if include_time {
        "Select Quit Date & Time"
    } else {
        "Select Quit Date"
    }
}

fn show_wheel(
    ui: &mut egui::Ui,
    picker: &mut DatePicker,
    field: Field,
    view: &mut WheelView,
    now: Instant,
) {
    let wheel_config = picker.config().wheel;
    let mut forced: Option<f32> = None;
    if let Some(request) = picker.take_scroll_request(field) {
        if request.animate {
            view.animation = Some(WheelAnimation {
                from: view.rendered_offset,
                to: request.offset,
                started: now,
            });
        } else {
            view.animation = None;
            forced = Some(request.offset);
        }
    }
    if let Some(animation) = view.animation {
        let (offset, done) = animation.offset_at(now);
        forced = Some(offset);
        if done {
            view.animation = None;
        }
    }

    let mut area = ScrollArea::vertical()
        .id_salt(("quit_wheel", field.label()))
        .max_height(wheel_config.viewport_height())
        .auto_shrink([false, true])
        .scroll_bar_visibility(egui::scroll_area::ScrollBarVisibility::AlwaysHidden);
    if let Some(offset) = forced {
        area = area.vertical_scroll_offset(offset);
    }

    let mut tapped: Option<usize> = None;
    let output = area.show(ui, |ui| {
        ui.spacing_mut().item_spacing.y = 0.0;
        ui.set_width(WHEEL_WIDTH);
        for row in picker.wheel_rows(field) {
            match row {
                WheelRow::Sentinel => {
                    ui.allocate_exact_size(
                        egui::vec2(WHEEL_WIDTH, wheel_config.item_height),
                        Sense::hover(),
                    );
                }
                WheelRow::Item {
                    index,
                    option,
                    selected,
                } => {
                    let text = if selected {
                        RichText::new(&option.label).size(20.0).strong()
                    } else {
                        RichText::new(&option.label).size(16.0).weak()
                    };
                    let response = ui.add_sized(
                        [WHEEL_WIDTH, wheel_config.item_height],
                        egui::Label::new(text).sense(Sense::click()),
                    );
                    if response.clicked() {
                        tapped = Some(index);
                    }
                }
            }
        }
    });

    let hovered = ui.rect_contains_pointer(output.inner_rect);
    let (pressed, down) = ui.input(|input| {
        (
            input.pointer.primary_pressed(),
            input.pointer.primary_down(),
        )
    });
    if hovered && pressed && !view.pointer_held {
        view.pointer_held = true;
        view.animation = None;
        picker.pointer_down(field);
    }

    let offset = output.state.offset.y;
    view.rendered_offset = offset;
    picker.scrolled(field, offset, now);

    if view.pointer_held && !down {
        view.pointer_held = false;
        picker.pointer_up(field, now);
    }
    if let Some(index) = tapped {
        picker.tapped(field, index);
    }
}

fn show_calendar(ui: &mut egui::Ui, picker: &mut DatePicker) {
    ui.horizontal(|ui| {
        if ui.small_button("◀").clicked() {
            picker.show_previous_month();
        }
        ui.label(RichText::new(picker.calendar().title()).strong());
        if ui
            .add_enabled(picker.can_show_next_month(), egui::Button::new("▶").small())
            .clicked()
        {
            picker.show_next_month();
        }
    });

    let labels = picker.calendar().weekday_labels();
    let cells = picker.calendar_cells();
    let mut chosen = None;
    egui::Grid::new("quit_calendar_grid")
        .num_columns(labels.len())
        .spacing([4.0, 2.0])
        .min_col_width(28.0)
        .show(ui, |ui| {
            for label in &labels {
                ui.label(RichText::new(*label).small().strong());
            }
            ui.end_row();
            for week in cells.chunks(labels.len()) {
                for cell in week {
                    let mut text = RichText::new(cell.date.format("%-d").to_string());
                    if !cell.in_month {
                        text = text.weak();
                    }
                    let button = egui::Button::new(text).selected(cell.selected);
                    if ui.add_enabled(cell.selectable, button).clicked() {
                        chosen = Some(cell.date);
                    }
                }
                ui.end_row();
            }
        });

    if let Some(date) = chosen {
        picker.select_calendar_date(date);
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    info!("starting eframe runtime");
    let start = Instant::now();
    let controller = QuitAppController::new(config)?;
    info!(
        items = controller.statuses.len(),
        elapsed_ms = %start.elapsed().as_millis(),
        "controller ready"
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Quit Toxic")
            .with_inner_size([520.0, 760.0])
            .with_min_inner_size([420.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Quit Toxic",
        native_options,
        Box::new(move |_cc| Ok(Box::new(controller))),
    )
    .map_err(|err| anyhow::anyhow!("eframe terminated: {err}"))
}
