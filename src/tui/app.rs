use crate::config::Config;
use crate::demand::Customer;
use crate::engine::{EngineConfig, Evaluator, MetricsReport, Recommendation, Recommender};
use crate::insights::BusinessReport;
use crate::load::MarketData;
use crate::supply::CacheConfig;
use crate::tui::theme::ThemeColors;
use ratatui::widgets::TableState;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Metrics,
    Recommendations,
    Insights,
    Data,
}

impl Page {
    pub const ALL: [Page; 5] = [
        Page::Overview,
        Page::Metrics,
        Page::Recommendations,
        Page::Insights,
        Page::Data,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Metrics => "Metrics",
            Page::Recommendations => "Recommendations",
            Page::Insights => "Insights",
            Page::Data => "Data",
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Help,
    ScoreBreakdown,
}

/// Which table the Data page shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataView {
    Customers,
    Products,
}

/// Everything the dashboard shows, computed off the UI task
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub data: MarketData,
    pub metrics: MetricsReport,
    pub report: BusinessReport,
}

impl Snapshot {
    pub fn build(data: MarketData, engine: &EngineConfig) -> Self {
        let metrics =
            Evaluator::from_config(engine).evaluate(&data.customers, &data.products, engine.sample_size());
        let report = crate::insights::business_report(&data.customers, &data.products);
        Self {
            data,
            metrics,
            report,
        }
    }
}

pub struct App {
    pub snapshot: Option<Snapshot>,
    pub page: Page,
    pub input_mode: InputMode,
    pub customer_state: TableState,
    pub data_state: TableState,
    pub data_view: DataView,
    pub flash_message: Option<(String, Instant)>,
    pub last_refresh: Instant,
    pub last_interaction: Instant,
    pub needs_refresh: bool,
    pub force_refresh: bool,
    pub should_quit: bool,
    pub config: Config,
    pub engine: EngineConfig,
    pub recommender: Recommender,
    pub cache_config: CacheConfig,
    pub theme: ThemeColors,
    pub is_loading: bool,
    pub spinner_frame: usize,
}

impl App {
    /// Create an App with no data in loading state, so the dashboard can
    /// draw before the first load finishes
    pub fn new_loading(config: Config, cache_config: CacheConfig, theme: ThemeColors) -> Self {
        let engine = config.engine();
        Self {
            snapshot: None,
            page: Page::Overview,
            input_mode: InputMode::Normal,
            customer_state: TableState::default(),
            data_state: TableState::default(),
            data_view: DataView::Customers,
            flash_message: None,
            last_refresh: Instant::now(),
            last_interaction: Instant::now(),
            needs_refresh: false,
            force_refresh: false,
            should_quit: false,
            recommender: Recommender::from_config(&engine),
            engine,
            config,
            cache_config,
            theme,
            is_loading: true,
            spinner_frame: 0,
        }
    }

    pub fn customers(&self) -> &[Customer] {
        self.snapshot
            .as_ref()
            .map(|s| s.data.customers.as_slice())
            .unwrap_or(&[])
    }

    fn data_len(&self) -> usize {
        match (&self.snapshot, self.data_view) {
            (None, _) => 0,
            (Some(s), DataView::Customers) => s.data.customers.len(),
            (Some(s), DataView::Products) => s.data.products.len(),
        }
    }

    /// The table j/k moves through on the current page
    fn active_table(&mut self) -> Option<(&mut TableState, usize)> {
        match self.page {
            Page::Recommendations => {
                let len = self.customers().len();
                Some((&mut self.customer_state, len))
            }
            Page::Data => {
                let len = self.data_len();
                Some((&mut self.data_state, len))
            }
            _ => None,
        }
    }

    pub fn next_row(&mut self) {
        if let Some((state, len)) = self.active_table() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(i) if i + 1 < len => i + 1,
                _ => 0,
            };
            state.select(Some(i));
        }
    }

    pub fn previous_row(&mut self) {
        if let Some((state, len)) = self.active_table() {
            if len == 0 {
                return;
            }
            let i = match state.selected() {
                Some(0) | None => len - 1,
                Some(i) => i - 1,
            };
            state.select(Some(i));
        }
    }

    pub fn next_page(&mut self) {
        self.page = self.page.next();
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.previous();
    }

    pub fn toggle_data_view(&mut self) {
        if self.page != Page::Data {
            return;
        }
        self.data_view = match self.data_view {
            DataView::Customers => DataView::Products,
            DataView::Products => DataView::Customers,
        };
        let len = self.data_len();
        self.data_state.select(if len == 0 { None } else { Some(0) });
    }

    pub fn selected_customer(&self) -> Option<&Customer> {
        self.customer_state
            .selected()
            .and_then(|i| self.customers().get(i))
    }

    /// Ranked products for the customer selected on the Recommendations page
    pub fn selected_recommendation(&self) -> Option<(&Customer, Recommendation<'_>)> {
        let snapshot = self.snapshot.as_ref()?;
        let customer = self.selected_customer()?;
        let rec = self.recommender.recommend(
            customer,
            &snapshot.data.products,
            self.engine.recommendation_count(),
        );
        Some((customer, rec))
    }

    pub fn update_flash(&mut self) {
        if let Some((_, timestamp)) = self.flash_message {
            if timestamp.elapsed().as_secs() >= 3 {
                self.flash_message = None;
            }
        }
    }

    pub fn show_flash(&mut self, msg: String) {
        self.flash_message = Some((msg, Instant::now()));
    }

    pub fn show_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn dismiss_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Show the top candidate's score breakdown; needs a selected customer
    pub fn show_score_breakdown(&mut self) {
        if self.page == Page::Recommendations && self.selected_customer().is_some() {
            self.input_mode = InputMode::ScoreBreakdown;
        }
    }

    pub fn dismiss_score_breakdown(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    /// Swap in freshly loaded data, keeping selections where they still fit
    pub fn update_snapshot(&mut self, snapshot: Snapshot) {
        let customers = snapshot.data.customers.len();
        let rejected = snapshot.data.rejected.len();
        self.snapshot = Some(snapshot);

        clamp_selection(&mut self.customer_state, customers);
        let len = self.data_len();
        clamp_selection(&mut self.data_state, len);

        self.last_refresh = Instant::now();
        let products = self.snapshot.as_ref().map_or(0, |s| s.data.products.len());
        self.show_flash(format!(
            "Refreshed ({} customers, {} products, {} rejected)",
            customers, products, rejected
        ));
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        Some(_) => {}
        None => state.select(Some(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{CatalogSource, SurveySource};
    use crate::supply::Product;
    use std::path::PathBuf;

    fn data(customers: usize) -> MarketData {
        MarketData {
            customers: (0..customers)
                .map(|i| Customer::new(format!("U{}", i), 900.0, 1100.0, "phone"))
                .collect(),
            products: vec![
                Product::new("1", "Phone X", 1000.0, 4.5, 100),
                Product::new("2", "Laptop Y", 50000.0, 4.7, 200),
            ],
            rejected: Vec::new(),
            unreadable: 0,
            survey_source: SurveySource::Synthetic,
            catalog_source: CatalogSource::File(PathBuf::from("catalog.json")),
            loaded_at: chrono::Local::now(),
        }
    }

    fn app_with(customers: usize) -> App {
        let mut app = App::new_loading(Config::default(), CacheConfig::default(), ThemeColors::dark());
        let engine = app.engine.clone();
        app.update_snapshot(Snapshot::build(data(customers), &engine));
        app
    }

    #[test]
    fn test_page_cycle_wraps() {
        assert_eq!(Page::Data.next(), Page::Overview);
        assert_eq!(Page::Overview.previous(), Page::Data);
        assert_eq!(Page::Metrics.next(), Page::Recommendations);
    }

    #[test]
    fn test_snapshot_selects_first_customer() {
        let app = app_with(3);
        assert_eq!(app.customer_state.selected(), Some(0));
        assert!(app.flash_message.as_ref().unwrap().0.starts_with("Refreshed (3 customers"));
        assert_eq!(app.snapshot.as_ref().unwrap().metrics.customers_total, 3);
    }

    #[test]
    fn test_rows_wrap_only_on_table_pages() {
        let mut app = app_with(3);
        app.next_row();
        assert_eq!(app.customer_state.selected(), Some(0));

        app.page = Page::Recommendations;
        app.previous_row();
        assert_eq!(app.customer_state.selected(), Some(2));
        app.next_row();
        assert_eq!(app.customer_state.selected(), Some(0));
    }

    #[test]
    fn test_reload_clamps_selection() {
        let mut app = app_with(5);
        app.customer_state.select(Some(4));
        let engine = app.engine.clone();
        app.update_snapshot(Snapshot::build(data(2), &engine));
        assert_eq!(app.customer_state.selected(), Some(1));
        app.update_snapshot(Snapshot::build(data(0), &engine));
        assert_eq!(app.customer_state.selected(), None);
    }

    #[test]
    fn test_selected_recommendation() {
        let mut app = app_with(1);
        let (customer, rec) = app.selected_recommendation().unwrap();
        assert_eq!(customer.id, "U0");
        assert_eq!(rec.candidates[0].product.id, "1");

        app.customer_state.select(None);
        assert!(app.selected_recommendation().is_none());
    }

    #[test]
    fn test_breakdown_needs_recommendations_page() {
        let mut app = app_with(1);
        app.show_score_breakdown();
        assert_eq!(app.input_mode, InputMode::Normal);
        app.page = Page::Recommendations;
        app.show_score_breakdown();
        assert_eq!(app.input_mode, InputMode::ScoreBreakdown);
    }

    #[test]
    fn test_data_view_toggle() {
        let mut app = app_with(4);
        app.toggle_data_view();
        assert_eq!(app.data_view, DataView::Customers);

        app.page = Page::Data;
        app.toggle_data_view();
        assert_eq!(app.data_view, DataView::Products);
        app.previous_row();
        assert_eq!(app.data_state.selected(), Some(1));
    }
}
