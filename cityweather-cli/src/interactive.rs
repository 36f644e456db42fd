//! Prompt-driven City Browser session.

use std::fmt;

use anyhow::Result;
use cityweather_core::{
    CityBrowser, CitySource, Navigation, PageOutcome, Route, SortField, WeatherSource, WeatherView,
};
use inquire::{InquireError, Select, Text};

use crate::render;

const MENU_PAGE_SIZE: usize = 15;

enum Choice {
    City(usize, String),
    LoadMore,
    Search,
    Sort(String, SortField),
    ShowTable,
    Quit,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::City(_, label) => f.write_str(label),
            Choice::LoadMore => f.write_str("» Load more cities"),
            Choice::Search => f.write_str("» Search..."),
            Choice::Sort(label, _) => write!(f, "» Sort by {label}"),
            Choice::ShowTable => f.write_str("» Print table"),
            Choice::Quit => f.write_str("» Quit"),
        }
    }
}

#[derive(Clone, Copy)]
enum CityAction {
    Open,
    Peek,
    Back,
}

impl fmt::Display for CityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CityAction::Open => "Open weather",
            CityAction::Peek => "Peek at weather (keep this list)",
            CityAction::Back => "Back",
        })
    }
}

/// `Ok(None)` when the user cancelled the prompt with Esc.
fn cancellable<T>(res: Result<T, InquireError>) -> Result<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn menu(browser: &CityBrowser) -> Vec<Choice> {
    let mut choices: Vec<Choice> = browser
        .sorted()
        .into_iter()
        .enumerate()
        .map(|(i, c)| Choice::City(i, render::city_row(c)))
        .collect();

    if browser.has_more() {
        choices.push(Choice::LoadMore);
    }
    choices.push(Choice::Search);
    for field in SortField::all() {
        choices.push(Choice::Sort(render::header_label(browser, *field), *field));
    }
    choices.push(Choice::ShowTable);
    choices.push(Choice::Quit);
    choices
}

fn report(outcome: PageOutcome) {
    match outcome {
        PageOutcome::Failed => eprintln!("Could not load cities, see log for details."),
        PageOutcome::Replaced { rows: 0 } => println!("No cities found."),
        PageOutcome::Appended { rows: 0 } => println!("No more cities."),
        _ => {}
    }
}

async fn show_weather<W>(weather: &W, route: &Route, color: bool)
where
    W: WeatherSource + ?Sized,
{
    if let Route::Weather { city } = route {
        let mut view = WeatherView::new(city.clone());
        view.load(weather).await;
        println!("{}", render::weather_card(&view, color));
    }
}

/// Run the browser until the user quits. Opening a city replaces the browser
/// with the weather view; afterwards a fresh browser starts at the listing.
pub async fn browse<C, W>(cities: &C, weather: &W, initial_query: &str, color: bool) -> Result<()>
where
    C: CitySource + ?Sized,
    W: WeatherSource + ?Sized,
{
    let mut query = initial_query.to_string();

    loop {
        let mut browser = CityBrowser::new();
        report(browser.search(cities, &query).await);

        let navigation = loop {
            let choices = menu(&browser);
            let title = format!(
                "Cities for '{}' ({} loaded)",
                browser.query(),
                browser.cities().len()
            );
            let picked = cancellable(
                Select::new(&title, choices)
                    .with_page_size(MENU_PAGE_SIZE)
                    .prompt(),
            )?;

            match picked {
                None | Some(Choice::Quit) => return Ok(()),
                Some(Choice::LoadMore) => {
                    if let Some(outcome) = browser.load_more(cities).await {
                        report(outcome);
                    }
                }
                Some(Choice::Search) => {
                    let text = cancellable(
                        Text::new("Search for cities:")
                            .with_initial_value(browser.query())
                            .prompt(),
                    )?;
                    if let Some(text) = text {
                        report(browser.search(cities, &text).await);
                    }
                }
                Some(Choice::Sort(_, field)) => browser.sort_by(field),
                Some(Choice::ShowTable) => println!("{}", render::city_table(&browser)),
                Some(Choice::City(idx, _)) => {
                    let Some(city) = browser.sorted().get(idx).map(|c| (*c).clone()) else {
                        continue;
                    };
                    let action = cancellable(
                        Select::new(
                            &city.name,
                            vec![CityAction::Open, CityAction::Peek, CityAction::Back],
                        )
                        .prompt(),
                    )?;
                    match action {
                        Some(CityAction::Open) => break browser.select_city(&city),
                        Some(CityAction::Peek) => {
                            let nav = browser.select_city_new_context(&city);
                            show_weather(weather, nav.route(), color).await;
                        }
                        Some(CityAction::Back) | None => {}
                    }
                }
            }
        };

        if let Navigation::Replace(route) = navigation {
            tracing::debug!(path = %route, "leaving city browser");
            show_weather(weather, &route, color).await;

            let back = cancellable(
                Select::new("Next", vec!["Back to cities", "Quit"]).prompt(),
            )?;
            if back != Some("Back to cities") {
                return Ok(());
            }
            query.clear();
        }
    }
}
