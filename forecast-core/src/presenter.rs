//! Row presenters for the hourly and daily lists.
//!
//! A presenter never owns forecast data. It holds a receiver on the
//! orchestrator's snapshot channel and reads from whatever snapshot it last
//! adopted through [`ListPresenter::refresh`]. Every refresh is a full
//! rebind; there is no diffing.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{CurrentConditions, DailyPoint, ForecastSnapshot, HourlyPoint};

pub const DEFAULT_ICON_URL_TEMPLATE: &str = "https://openweathermap.org/img/w/{icon}.png";

/// External image loader. `load` must not block: implementations queue or
/// spawn the download and cache it themselves.
pub trait IconLoader: Send + Sync {
    fn load(&self, url: &str);
}

/// Maps an icon code to its image URL.
#[derive(Debug, Clone)]
pub struct IconUrls {
    template: String,
}

impl IconUrls {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn url_for(&self, icon_ref: &str) -> String {
        self.template.replace("{icon}", icon_ref)
    }
}

impl Default for IconUrls {
    fn default() -> Self {
        Self::new(DEFAULT_ICON_URL_TEMPLATE)
    }
}

/// Something a list row can be rendered from.
pub trait ForecastRow {
    fn label(&self) -> &str;
    fn temperature_c(&self) -> f64;
    fn icon_ref(&self) -> &str;
}

impl ForecastRow for HourlyPoint {
    fn label(&self) -> &str {
        &self.time
    }

    fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    fn icon_ref(&self) -> &str {
        &self.icon_ref
    }
}

impl ForecastRow for DailyPoint {
    fn label(&self) -> &str {
        &self.day_label
    }

    fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    fn icon_ref(&self) -> &str {
        &self.icon_ref
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub label: String,
    pub temperature: String,
    pub icon_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentView {
    pub city: String,
    pub temperature: String,
    pub description: String,
    pub date: String,
    pub icon_url: String,
}

pub fn format_temperature(celsius: f64) -> String {
    format!("{celsius:.1}°C")
}

type Select<T> = fn(&ForecastSnapshot) -> &[T];

fn hourly_rows(snapshot: &ForecastSnapshot) -> &[HourlyPoint] {
    &snapshot.hourly
}

fn daily_rows(snapshot: &ForecastSnapshot) -> &[DailyPoint] {
    &snapshot.daily
}

pub struct ListPresenter<T> {
    updates: watch::Receiver<Arc<ForecastSnapshot>>,
    snapshot: Arc<ForecastSnapshot>,
    select: Select<T>,
    icons: IconUrls,
    loader: Arc<dyn IconLoader>,
}

pub type HourlyPresenter = ListPresenter<HourlyPoint>;
pub type DailyPresenter = ListPresenter<DailyPoint>;

impl HourlyPresenter {
    pub fn hourly(
        updates: watch::Receiver<Arc<ForecastSnapshot>>,
        icons: IconUrls,
        loader: Arc<dyn IconLoader>,
    ) -> Self {
        Self::new(updates, hourly_rows, icons, loader)
    }
}

impl DailyPresenter {
    pub fn daily(
        updates: watch::Receiver<Arc<ForecastSnapshot>>,
        icons: IconUrls,
        loader: Arc<dyn IconLoader>,
    ) -> Self {
        Self::new(updates, daily_rows, icons, loader)
    }
}

impl<T: ForecastRow> ListPresenter<T> {
    fn new(
        mut updates: watch::Receiver<Arc<ForecastSnapshot>>,
        select: Select<T>,
        icons: IconUrls,
        loader: Arc<dyn IconLoader>,
    ) -> Self {
        let snapshot = updates.borrow_and_update().clone();
        Self {
            updates,
            snapshot,
            select,
            icons,
            loader,
        }
    }

    fn rows(&self) -> &[T] {
        (self.select)(&self.snapshot)
    }

    pub fn item_count(&self) -> usize {
        self.rows().len()
    }

    /// Render row `index` and kick off its icon load.
    pub fn bind(&self, index: usize) -> Option<RenderedRow> {
        let row = self.rows().get(index)?;
        let icon_url = self.icons.url_for(row.icon_ref());
        self.loader.load(&icon_url);

        Some(RenderedRow {
            label: row.label().to_string(),
            temperature: format_temperature(row.temperature_c()),
            icon_url,
        })
    }

    /// Bind every row in order.
    pub fn bind_all(&self) -> Vec<RenderedRow> {
        (0..self.item_count()).filter_map(|i| self.bind(i)).collect()
    }

    /// Adopt the latest published snapshot. Returns `true` if it changed and
    /// the rendering layer should rebind.
    pub fn refresh(&mut self) -> bool {
        let changed = match self.updates.has_changed() {
            Ok(changed) => changed,
            // Sender gone; its last value may still be unseen.
            Err(_) => !Arc::ptr_eq(&self.updates.borrow(), &self.snapshot),
        };
        if !changed {
            return false;
        }
        self.snapshot = self.updates.borrow_and_update().clone();
        true
    }

    /// Wait for the next replacement and adopt it. Returns `false` once the
    /// orchestrator is gone.
    pub async fn changed(&mut self) -> bool {
        if self.updates.changed().await.is_err() {
            return false;
        }
        self.snapshot = self.updates.borrow_and_update().clone();
        true
    }
}

/// Render the header block and kick off its icon load.
pub fn current_view(
    current: &CurrentConditions,
    icons: &IconUrls,
    loader: &dyn IconLoader,
) -> CurrentView {
    let icon_url = icons.url_for(&current.icon_ref);
    loader.load(&icon_url);

    CurrentView {
        city: current.city_name.clone(),
        temperature: format_temperature(current.temperature_c),
        description: current.description.clone(),
        date: current.display_date.clone(),
        icon_url,
    }
}
