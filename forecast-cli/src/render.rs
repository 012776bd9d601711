use forecast_core::{
    ForecastSnapshot, IconLoader, IconUrls, RenderedRow,
    presenter::{ForecastRow, ListPresenter, current_view},
};

pub fn print_header(snapshot: &ForecastSnapshot, icons: &IconUrls, loader: &dyn IconLoader) {
    let Some(current) = snapshot.current.as_ref() else {
        println!("No forecast data available.");
        return;
    };

    let view = current_view(current, icons, loader);
    println!("{}", view.city);
    println!("{}  {}", view.temperature, view.description);
    println!("{}", view.date);
}

pub fn print_list<T: ForecastRow>(
    title: &str,
    presenter: &ListPresenter<T>,
    show_icons: bool,
) {
    if presenter.item_count() == 0 {
        return;
    }

    println!();
    println!("{title}");
    for row in presenter.bind_all() {
        println!("{}", format_row(&row, show_icons));
    }
}

fn format_row(row: &RenderedRow, show_icons: bool) -> String {
    if show_icons {
        format!("  {:<6} {:>8}  {}", row.label, row.temperature, row.icon_url)
    } else {
        format!("  {:<6} {:>8}", row.label, row.temperature)
    }
}
