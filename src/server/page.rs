//! Renders the entry form page.

use crate::model::{Entry, PaymentMethod, BATCH_SIZE, DATE_FORMAT};
use crate::register::Today;
use chrono::NaiveDate;
use maud::{html, Markup, PreEscaped, DOCTYPE};

/// The default quantity shown in an empty line of the form.
const DEFAULT_QUANTITY: &str = "1";

const COLUMN_TITLES: [&str; 7] = [
    "Placa",
    "Qtd",
    "Valor (Soma: 10+20)",
    "Taxa",
    "Add",
    "Saiu",
    "Forma",
];

/// A message shown above the form after a submission.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) enum Banner {
    Success(usize),
    Error(String),
}

impl Banner {
    fn class(&self) -> &'static str {
        match self {
            Banner::Success(_) => "success",
            Banner::Error(_) => "error",
        }
    }

    fn text(&self) -> String {
        match self {
            Banner::Success(n) => format!("✅ {n} registros enviados com sucesso!"),
            Banner::Error(e) => format!("Erro ao enviar: {e}"),
        }
    }
}

/// Renders the whole page. `today` is `None` when the day's totals could not be read, in which
/// case the totals are shown as dashes. `entries` pre-fills the form lines; missing lines are
/// rendered empty.
pub(crate) fn render(
    date: NaiveDate,
    today: Option<&Today>,
    banner: Option<&Banner>,
    entries: &[Entry],
) -> Markup {
    let (vehicles, boletos) = match today {
        Some(today) => (
            today.totals().vehicles().to_string(),
            today.totals().boletos().to_string(),
        ),
        None => ("-".to_string(), "-".to_string()),
    };
    let blank = Entry {
        quantity: DEFAULT_QUANTITY.to_string(),
        ..Entry::default()
    };

    html! {
        (DOCTYPE)
        html lang="pt-BR" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Caixa Express 8x" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                h1 { "⚡ Lançamento de pagamentos" }
                div class="metrics" {
                    (metric("Veículos Hoje", &vehicles))
                    (metric("Total Boletos Hoje", &boletos))
                    (metric("Data", &date.format(DATE_FORMAT).to_string()))
                }
                hr;
                @if let Some(banner) = banner {
                    p class={ "banner " (banner.class()) } { (banner.text()) }
                }
                form method="post" action="/" {
                    table {
                        tr {
                            @for title in COLUMN_TITLES {
                                th { (title) }
                            }
                        }
                        @for i in 0..BATCH_SIZE {
                            (line(i, entries.get(i).unwrap_or(&blank)))
                        }
                    }
                    button type="submit" { "🚀 ENVIAR" }
                }
            }
        }
    }
}

fn metric(label: &str, value: &str) -> Markup {
    html! {
        div class="metric" {
            span { (label) }
            strong { (value) }
        }
    }
}

/// One line of the form. Field names are a letter for the field followed by the line number,
/// e.g. `p0` for the plate of the first line.
fn line(i: usize, entry: &Entry) -> Markup {
    let fields = [
        ("p", &entry.plate),
        ("q", &entry.quantity),
        ("v", &entry.value),
        ("t", &entry.fee),
        ("a", &entry.addition),
        ("s", &entry.exited),
    ];
    html! {
        tr {
            @for (name, value) in fields {
                td { input type="text" name={ (name) (i) } value=(value); }
            }
            td {
                select name={ "f" (i) } {
                    @for method in PaymentMethod::ALL {
                        option selected[method == entry.method] { (method) }
                    }
                }
            }
        }
    }
}

const STYLE: &str = "
body { font-family: sans-serif; margin: 1.5rem; }
.metrics { display: flex; gap: 3rem; }
.metric span { display: block; color: #555; }
.metric strong { font-size: 2rem; }
.banner { padding: .75rem; border-radius: .25rem; }
.success { background: #e6f4ea; }
.error { background: #fce8e6; }
table { border-collapse: collapse; width: 100%; }
input, select { width: 100%; box-sizing: border-box; }
button { margin-top: 1rem; padding: .5rem 2rem; }
";
