/// egui widgets: filter panel, top bar, and the dashboard charts.
pub mod panels;
pub mod plot;
