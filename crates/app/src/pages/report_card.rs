//! Tabular view of a strain report pulled out of an assistant reply.

use eframe::egui;
use shared::strain_report::StrainReport;

/// Label and display text for each field present in `report`, in reply order.
pub fn report_rows(report: &StrainReport) -> Vec<(&'static str, String)> {
    report
        .fields()
        .map(|(field, value)| (field.label(), value.items().join("\n")))
        .collect()
}

pub fn show(ui: &mut egui::Ui, id: egui::Id, report: &StrainReport) {
    egui::Frame::group(ui.style())
        .rounding(egui::Rounding::same(8.0))
        .show(ui, |ui| {
            if let Some(score) = report.rating_score() {
                ui.label(egui::RichText::new(format!("⭐ {:.1}", score)).strong());
                ui.add_space(4.0);
            }
            egui::Grid::new(id)
                .num_columns(2)
                .striped(true)
                .spacing([12.0, 6.0])
                .show(ui, |ui| {
                    for (label, value) in report_rows(report) {
                        ui.label(egui::RichText::new(label).strong());
                        ui.label(value);
                        ui.end_row();
                    }
                });
        });
}
