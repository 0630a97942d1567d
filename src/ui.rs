use crate::app::{ChartHandle, LoadState, Orchestrator};
use crate::chart::{format_time_label, nearest_at, plot_bounds};
use crate::config::AppConfig;
use crate::error::LoadError;
use crate::loader::{source_for, spawn_load};
use crate::model::{SeriesColor, TableRow};
use eframe::egui;
use egui::{Color32, Context, FontFamily, FontId, Margin, RichText, Stroke, Visuals};
use egui_extras::{Column, TableBuilder};
use egui_plot::{uniform_grid_spacer, Legend, Line, Plot, PlotBounds, PlotPoints, VLine};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

const ACCENT: Color32 = Color32::from_rgb(120, 180, 255);
const MUTED: Color32 = Color32::from_rgb(150, 160, 175);

pub fn set_custom_style(ctx: &Context) {
    let mut visuals = Visuals::dark();

    visuals.panel_fill = Color32::from_rgb(18, 21, 27);
    visuals.window_fill = Color32::from_rgb(24, 28, 36);
    visuals.extreme_bg_color = Color32::from_rgb(30, 35, 45);
    visuals.faint_bg_color = Color32::from_rgb(26, 30, 39);

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(36, 42, 54);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(60, 70, 88));
    visuals.widgets.hovered.bg_fill = Color32::from_rgb(48, 56, 72);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.5, ACCENT);

    visuals.selection.bg_fill = Color32::from_rgb(45, 75, 120);
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = Margin::same(12);
    style.spacing.button_padding = egui::vec2(10.0, 6.0);

    style.text_styles.insert(
        egui::TextStyle::Body,
        FontId::new(15.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        FontId::new(20.0, FontFamily::Proportional),
    );

    ctx.set_style(style);
}

fn color32(color: SeriesColor) -> Color32 {
    let [r, g, b] = color.0;
    Color32::from_rgb(r, g, b)
}

pub struct PriceApp {
    orchestrator: Orchestrator,
    pending: Option<Receiver<Result<String, LoadError>>>,
    config: AppConfig,
    // chart revision last handed to the plot, to reset zoom on change
    drawn: Option<u32>,
}

impl PriceApp {
    pub fn new(config: AppConfig) -> Self {
        let pending = Some(spawn_load(source_for(&config.source)));
        Self {
            orchestrator: Orchestrator::new(config.clone()),
            pending,
            config,
            drawn: None,
        }
    }

    fn poll_load(&mut self) {
        let polled = match &self.pending {
            Some(rx) => rx.try_recv(),
            None => return,
        };
        match polled {
            Ok(result) => {
                self.pending = None;
                self.orchestrator.on_load(result);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                self.orchestrator.on_load(Err(LoadError::WorkerGone));
            }
        }
    }

    fn table(ui: &mut egui::Ui, rows: &[TableRow]) {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::remainder().at_least(140.0).clip(true))
            .column(Column::exact(100.0))
            .header(28.0, |mut header| {
                header.col(|ui| {
                    ui.strong(RichText::new("Product").color(MUTED));
                });
                header.col(|ui| {
                    ui.strong(RichText::new("Latest Price").color(MUTED));
                });
            })
            .body(|body| {
                body.rows(26.0, rows.len(), |mut row| {
                    let r = &rows[row.index()];
                    row.col(|ui| {
                        ui.label(r.product.as_str());
                    });
                    row.col(|ui| {
                        ui.label(RichText::new(&r.price).color(ACCENT).strong());
                    });
                });
            });
    }
}

/// Draws the chart. `drawn` holds the revision last shown; on a new revision
/// the plot view is reset to the computed bounds.
fn draw_chart(ui: &mut egui::Ui, chart: &ChartHandle, drawn: &mut Option<u32>) {
    let config = &chart.config;
    let label_format = config.time_axis.label_format.clone();
    let tick = config.time_axis.unit.millis() * f64::from(config.time_axis.step.max(1));

    let mut plot = Plot::new("price_chart")
        .legend(Legend::default())
        .height((ui.available_height() - 40.0).max(200.0))
        .x_axis_label("Date")
        .y_axis_label(config.value_axis.label.clone())
        .x_axis_formatter(move |mark, _range| format_time_label(mark.value, &label_format))
        .x_grid_spacer(uniform_grid_spacer(move |_input| [tick / 7.0, tick, tick * 4.0]));

    let fresh = *drawn != Some(chart.revision);
    if fresh {
        plot = plot.reset();
        *drawn = Some(chart.revision);
    }

    let crosshair = config.tooltip.crosshair;
    let hovered = plot
        .show(ui, |plot_ui| {
            if fresh {
                let (min, max) = plot_bounds(config);
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(min, max));
            }

            for dataset in &config.datasets {
                let points = PlotPoints::from(dataset.points.clone());
                plot_ui.line(
                    Line::new(dataset.label.clone(), points)
                        .color(color32(dataset.color))
                        .width(2.0),
                );
            }

            let pointer = plot_ui.pointer_coordinate();
            if let (true, Some(p)) = (crosshair, pointer) {
                plot_ui.vline(VLine::new("", p.x).color(MUTED).width(1.0));
            }
            pointer
        })
        .inner;

    ui.horizontal_wrapped(|ui| match hovered {
        Some(pointer) => {
            for (label, [x, y]) in nearest_at(&config.datasets, pointer.x) {
                let color = config
                    .datasets
                    .iter()
                    .find(|d| d.label == label)
                    .map(|d| color32(d.color))
                    .unwrap_or(MUTED);
                ui.label(
                    RichText::new(format!(
                        "{}: {:.2} ({})",
                        label,
                        y,
                        format_time_label(x, &config.time_axis.label_format)
                    ))
                    .color(color),
                );
                ui.separator();
            }
        }
        None => {
            ui.label(RichText::new("Hover the chart to compare prices").color(MUTED));
        }
    });
}

impl eframe::App for PriceApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_load();

        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading(RichText::new("📈 Price History").color(ACCENT).strong());
                ui.separator();
                ui.label(RichText::new(&self.config.source).color(MUTED).small());
            });
            ui.add_space(4.0);
        });

        let LoadState::Loaded(data) = self.orchestrator.state() else {
            let failed = matches!(self.orchestrator.state(), LoadState::Unloaded { failed: true });
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.centered_and_justified(|ui| {
                    if failed {
                        ui.label(
                            RichText::new("Could not load price data, see the log for details")
                                .size(18.0)
                                .color(Color32::from_rgb(255, 120, 120)),
                        );
                    } else {
                        ui.label(RichText::new("Loading price data…").size(18.0).color(MUTED));
                    }
                });
            });
            if self.pending.is_some() {
                ctx.request_repaint_after(Duration::from_millis(100));
            }
            return;
        };

        let mut chosen = None;

        egui::SidePanel::left("summary")
            .min_width(260.0)
            .max_width(380.0)
            .show(ctx, |ui| {
                ui.heading(RichText::new("Latest Prices").color(ACCENT));
                ui.separator();

                ui.label(RichText::new("Product").strong());
                let current = data
                    .filter
                    .iter()
                    .find(|f| f.selection == data.selection)
                    .map(|f| f.label.clone())
                    .unwrap_or_default();
                egui::ComboBox::from_id_salt("product_filter")
                    .selected_text(current)
                    .width(220.0)
                    .show_ui(ui, |ui| {
                        for entry in &data.filter {
                            let selected = entry.selection == data.selection;
                            if ui.selectable_label(selected, entry.label.as_str()).clicked() && !selected {
                                chosen = Some(entry.selection.clone());
                            }
                        }
                    });

                ui.add_space(8.0);
                ui.separator();

                if data.table.is_empty() {
                    ui.label(RichText::new("No valid prices").color(MUTED));
                } else {
                    Self::table(ui, &data.table);
                }
            });

        if let Some(selection) = chosen {
            self.orchestrator.select(selection);
        }

        let drawn = &mut self.drawn;
        if let Some(chart) = self.orchestrator.chart() {
            egui::CentralPanel::default().show(ctx, |ui| {
                draw_chart(ui, chart, drawn);
            });
        }
    }
}
