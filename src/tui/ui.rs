use ratatui::prelude::*;
use ratatui::widgets::{Block, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};

use crate::insights::{price_histogram, top_cities};
use crate::output::{format_price, format_score, truncate_title};
use crate::tui::app::{App, DataView, InputMode, Page, Snapshot};
use crate::tui::theme::ThemeColors;

const HISTOGRAM_BINS: usize = 10;

pub fn draw(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Handle very small terminal sizes gracefully
    if area.height < 8 || area.width < 40 {
        let msg = Paragraph::new("Terminal too small").alignment(Alignment::Center);
        frame.render_widget(msg, area);
        return;
    }

    // Layout: Title(1) + Tabs(1) + Body(fill) + Status(1)
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ])
    .split(area);

    render_title(frame, chunks[0], app);
    render_tabs(frame, chunks[1], app);
    match app.page {
        Page::Overview => render_overview(frame, chunks[2], app),
        Page::Metrics => render_metrics(frame, chunks[2], app),
        Page::Recommendations => render_recommendations(frame, chunks[2], app),
        Page::Insights => render_insights(frame, chunks[2], app),
        Page::Data => render_data(frame, chunks[2], app),
    }
    render_status_bar(frame, chunks[3], app);

    match app.input_mode {
        InputMode::Help => render_help_popup(frame, &app.theme),
        InputMode::ScoreBreakdown => render_breakdown_popup(frame, app),
        InputMode::Normal => {}
    }

    if app.is_loading {
        render_loading_overlay(frame, app);
    }
}

fn render_title(frame: &mut Frame, area: Rect, app: &App) {
    let t = &app.theme;
    let left = "Market Match";
    let mut spans = vec![Span::styled(left, Style::default().fg(t.title_color).bold())];

    if let Some(ref snapshot) = app.snapshot {
        let sources = format!(
            "survey: {}  catalog: {}",
            snapshot.data.survey_source, snapshot.data.catalog_source
        );
        let padding_len = (area.width as usize).saturating_sub(left.len() + sources.chars().count());
        spans.push(Span::raw(" ".repeat(padding_len)));
        spans.push(Span::styled(sources, Style::default().fg(t.muted)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<&str> = Page::ALL.iter().map(|p| p.title()).collect();
    let tabs = Tabs::new(titles)
        .select(app.page.index())
        .style(app.theme.tab_inactive_style)
        .highlight_style(app.theme.tab_active_style)
        .divider(" | ");
    frame.render_widget(tabs, area);
}

fn render_empty(frame: &mut Frame, area: Rect, msg: &str) {
    let empty_msg = Paragraph::new(msg)
        .alignment(Alignment::Center)
        .block(Block::default());
    frame.render_widget(empty_msg, area);
}

/// Horizontal bar, `ratio` in [0, 1]
fn bar(ratio: f64, width: usize, color: Color, empty_color: Color) -> Vec<Span<'static>> {
    let filled = (ratio.clamp(0.0, 1.0) * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);

    let mut spans = Vec::new();
    if filled > 0 {
        spans.push(Span::styled("█".repeat(filled), Style::default().fg(color)));
    }
    if empty > 0 {
        spans.push(Span::styled("░".repeat(empty), Style::default().fg(empty_color)));
    }
    spans
}

fn stat_line<'a>(label: &'a str, value: String, t: &ThemeColors) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<22}", label), Style::default().fg(t.muted)),
        Span::styled(value, Style::default().bold()),
    ])
}

fn render_overview(frame: &mut Frame, area: Rect, app: &App) {
    let Some(ref snapshot) = app.snapshot else {
        return render_empty(frame, area, "No data loaded yet");
    };
    let t = &app.theme;
    let o = &snapshot.report.overview;

    let chunks = Layout::horizontal([Constraint::Length(44), Constraint::Fill(1)]).split(area);

    let mut lines = vec![
        stat_line("Customers", o.customers.to_string(), t),
        stat_line("Products", o.products.to_string(), t),
        stat_line("Avg budget (high)", format_price(o.avg_budget_high), t),
        stat_line("Avg market price", format_price(o.avg_market_price), t),
        stat_line("Cities", o.unique_cities.to_string(), t),
        stat_line("Keywords", o.unique_keywords.to_string(), t),
    ];
    if let Some((lo, hi)) = o.age_range {
        lines.push(stat_line("Age range", format!("{}-{}", lo, hi), t));
    }
    lines.push(stat_line(
        "Rejected records",
        snapshot.data.rejected.len().to_string(),
        t,
    ));
    lines.push(stat_line(
        "Loaded at",
        snapshot.data.loaded_at.format("%H:%M:%S").to_string(),
        t,
    ));
    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(" Market ")),
        chunks[0],
    );

    render_histogram(frame, chunks[1], snapshot, t);
}

fn render_histogram(frame: &mut Frame, area: Rect, snapshot: &Snapshot, t: &ThemeColors) {
    let prices: Vec<f64> = snapshot.data.products.iter().map(|p| p.price).collect();
    let bins = price_histogram(&prices, HISTOGRAM_BINS);
    let most = bins.iter().map(|b| b.count).max().unwrap_or(0);

    let block = Block::bordered().title(" Catalog price distribution ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if bins.is_empty() {
        return render_empty(frame, inner, "Catalog is empty");
    }

    let label_width = 26;
    let bar_width = (inner.width as usize).saturating_sub(label_width + 8).max(4);
    let lines: Vec<Line> = bins
        .iter()
        .map(|b| {
            let ratio = if most > 0 { b.count as f64 / most as f64 } else { 0.0 };
            let mut spans = vec![Span::styled(
                format!(
                    "{:>12} - {:<11}",
                    format_price(b.low),
                    format_price(b.high)
                ),
                Style::default().fg(t.muted),
            )];
            spans.extend(bar(ratio, bar_width, t.title_color, t.bar_empty));
            spans.push(Span::raw(format!(" {}", b.count)));
            Line::from(spans)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_metrics(frame: &mut Frame, area: Rect, app: &App) {
    let Some(ref snapshot) = app.snapshot else {
        return render_empty(frame, area, "No data loaded yet");
    };
    let t = &app.theme;
    let m = &snapshot.metrics;

    let rows_data = [
        ("Category coverage", m.category_coverage),
        ("Price accuracy", m.price_accuracy),
        ("Precision@1 keyword", m.precision_at_1_keyword),
        ("Precision@3 keyword", m.precision_at_3_keyword),
        ("Precision@1 price", m.precision_at_1_price),
        ("Precision@3 price", m.precision_at_3_price),
    ];

    let bar_width = (area.width as usize).saturating_sub(22 + 10 + 6).clamp(4, 50);
    let rows: Vec<Row> = rows_data
        .iter()
        .enumerate()
        .map(|(idx, (label, value))| {
            let color = t.percent_color(*value);
            let row_style = if idx % 2 == 1 {
                Style::default().bg(t.row_alt_bg)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(*label),
                Cell::from(Span::styled(format!("{:>6.1}%", value), Style::default().fg(color).bold())),
                Cell::from(Line::from(bar(value / 100.0, bar_width, color, t.bar_empty))),
            ])
            .style(row_style)
        })
        .collect();

    let chunks = Layout::vertical([Constraint::Length(9), Constraint::Fill(1)]).split(area);
    let table = Table::new(
        rows,
        [Constraint::Length(22), Constraint::Length(10), Constraint::Fill(1)],
    )
    .header(
        Row::new(vec!["Metric", "Value", ""])
            .style(t.header_style)
            .bottom_margin(1),
    );
    frame.render_widget(table, chunks[0]);

    let summary = vec![
        Line::from(format!(
            "{} customers, {} with at least one product inside their budget.",
            m.customers_total, m.customers_price_matched
        )),
        Line::from(format!(
            "Precision uses the first {} customers: {} scored, {} without recommendations.",
            app.engine.sample_size(),
            m.customers_sampled,
            m.customers_skipped
        )),
    ];
    frame.render_widget(
        Paragraph::new(summary)
            .style(Style::default().fg(t.muted))
            .wrap(Wrap { trim: true }),
        chunks[1],
    );
}

fn render_recommendations(frame: &mut Frame, area: Rect, app: &mut App) {
    if app.snapshot.is_none() {
        return render_empty(frame, area, "No data loaded yet");
    }
    let chunks = Layout::horizontal([Constraint::Length(40), Constraint::Fill(1)]).split(area);

    // Customer list
    let t = app.theme.clone();
    let rows: Vec<Row> = app
        .customers()
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let row_style = if idx % 2 == 1 {
                Style::default().bg(t.row_alt_bg)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(c.id.clone()).style(Style::default().fg(t.index_color)),
                Cell::from(truncate_title(&c.keyword, 12)),
                Cell::from(format!("{:.0}-{:.0}", c.budget_low, c.budget_high)),
            ])
            .style(row_style)
        })
        .collect();
    let table = Table::new(
        rows,
        [Constraint::Length(10), Constraint::Length(12), Constraint::Fill(1)],
    )
    .header(Row::new(vec!["ID", "Keyword", "Budget"]).style(t.header_style))
    .block(Block::bordered().title(" Customers "))
    .row_highlight_style(t.row_selected);
    frame.render_stateful_widget(table, chunks[0], &mut app.customer_state);

    // Ranked products for the selected customer
    let Some((customer, rec)) = app.selected_recommendation() else {
        return render_empty(frame, chunks[1], "Select a customer");
    };

    let mut title = format!(" {} | keyword \"{}\" ", customer.label(), customer.keyword);
    if rec.fallback {
        title.push_str("| nothing near budget, whole catalog ranked ");
    }
    let block = Block::bordered().title(title);

    if rec.is_empty() {
        let inner = block.inner(chunks[1]);
        frame.render_widget(block, chunks[1]);
        return render_empty(frame, inner, "No products to recommend");
    }

    let best = rec.candidates.first().map_or(0.0, |c| c.score());
    let worst = rec.candidates.last().map_or(0.0, |c| c.score());
    let rows: Vec<Row> = rec
        .candidates
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            let p = c.product;
            let in_budget = customer.in_budget(p.price);
            let keyword_hit = customer.keyword_matches(&p.title);
            Row::new(vec![
                Cell::from(format!("{}.", idx + 1)).style(Style::default().fg(t.index_color)),
                Cell::from(Span::styled(
                    format_score(c.score()),
                    Style::default().fg(t.score_color(c.score(), best, worst)),
                )),
                Cell::from(Span::styled(
                    format_price(p.price),
                    Style::default().fg(if in_budget { t.good } else { t.muted }),
                )),
                Cell::from(format!("{:.1} ({})", p.rating, p.rating_count)),
                Cell::from(Span::styled(
                    p.title.clone(),
                    if keyword_hit {
                        Style::default().fg(t.accent).bold()
                    } else {
                        Style::default()
                    },
                )),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Length(9),
            Constraint::Length(13),
            Constraint::Length(12),
            Constraint::Fill(1),
        ],
    )
    .header(
        Row::new(vec!["#", "Score", "Price", "Rating", "Title"])
            .style(t.header_style)
            .bottom_margin(1),
    )
    .block(block);
    frame.render_widget(table, chunks[1]);
}

fn render_insights(frame: &mut Frame, area: Rect, app: &App) {
    let Some(ref snapshot) = app.snapshot else {
        return render_empty(frame, area, "No data loaded yet");
    };
    let t = &app.theme;
    let r = &snapshot.report;

    let chunks = Layout::horizontal([Constraint::Fill(2), Constraint::Fill(1)]).split(area);

    let stock = &r.smartphone_stock;
    let stock_span = if stock.high_demand {
        Span::styled("HIGH DEMAND", Style::default().fg(t.poor).bold())
    } else {
        Span::styled("ok", Style::default().fg(t.good))
    };
    let lines = vec![
        stat_line("Mouse combo", format!("{} interested customers", r.combo_candidates), t),
        stat_line(
            "Audio budget gap",
            format!(
                "{} expected vs {} market",
                format_price(r.audio_gap.avg_expected),
                format_price(r.audio_gap.avg_market)
            ),
            t,
        ),
        stat_line("", format!("gap {}", format_price(r.audio_gap.gap)), t),
        stat_line("Cooling pad cross-sell", format!("{} gaming/laptop customers", r.cross_sell_candidates), t),
        Line::from(vec![
            Span::styled(format!("{:<22}", "Smartphone stock"), Style::default().fg(t.muted)),
            Span::styled(
                format!("demand {} / supply {} ", stock.demand, stock.supply),
                Style::default().bold(),
            ),
            stock_span,
        ]),
        stat_line(
            "Premium segment",
            format!("{} above {}", r.premium_customers, format_price(r.premium_threshold)),
            t,
        ),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::bordered().title(" Opportunities ")),
        chunks[0],
    );

    let side = Layout::vertical([Constraint::Fill(1), Constraint::Fill(1)]).split(chunks[1]);
    let trending: Vec<Line> = r
        .trending
        .iter()
        .enumerate()
        .map(|(i, (keyword, count))| Line::from(format!("{:>2}. {:<14}{}", i + 1, keyword, count)))
        .collect();
    frame.render_widget(
        Paragraph::new(trending).block(Block::bordered().title(" Trending keywords ")),
        side[0],
    );

    let cities: Vec<Line> = top_cities(&snapshot.data.customers, 5)
        .into_iter()
        .enumerate()
        .map(|(i, (city, count))| Line::from(format!("{:>2}. {:<14}{}", i + 1, city, count)))
        .collect();
    frame.render_widget(
        Paragraph::new(cities).block(Block::bordered().title(" Top cities ")),
        side[1],
    );
}

fn render_data(frame: &mut Frame, area: Rect, app: &mut App) {
    let Some(ref snapshot) = app.snapshot else {
        return render_empty(frame, area, "No data loaded yet");
    };
    let t = &app.theme;
    let alt = |idx: usize| {
        if idx % 2 == 1 {
            Style::default().bg(t.row_alt_bg)
        } else {
            Style::default()
        }
    };

    let table = match app.data_view {
        DataView::Customers => {
            let rows: Vec<Row> = snapshot
                .data
                .customers
                .iter()
                .enumerate()
                .map(|(idx, c)| {
                    Row::new(vec![
                        Cell::from(c.id.clone()),
                        Cell::from(c.name.clone().unwrap_or_default()),
                        Cell::from(c.age.map(|a| a.to_string()).unwrap_or_default()),
                        Cell::from(c.city.clone().unwrap_or_default()),
                        Cell::from(format_price(c.budget_low)),
                        Cell::from(format_price(c.budget_high)),
                        Cell::from(c.keyword.clone()),
                    ])
                    .style(alt(idx))
                })
                .collect();
            Table::new(
                rows,
                [
                    Constraint::Length(10),
                    Constraint::Length(16),
                    Constraint::Length(4),
                    Constraint::Length(11),
                    Constraint::Length(11),
                    Constraint::Length(11),
                    Constraint::Fill(1),
                ],
            )
            .header(
                Row::new(vec!["ID", "Name", "Age", "City", "Low", "High", "Keyword"])
                    .style(t.header_style),
            )
            .block(Block::bordered().title(format!(
                " Customers ({}) | p: products ",
                snapshot.data.customers.len()
            )))
        }
        DataView::Products => {
            let rows: Vec<Row> = snapshot
                .data
                .products
                .iter()
                .enumerate()
                .map(|(idx, p)| {
                    Row::new(vec![
                        Cell::from(p.id.clone()),
                        Cell::from(format_price(p.price)),
                        Cell::from(format!("{:.1}", p.rating)),
                        Cell::from(p.rating_count.to_string()),
                        Cell::from(p.title.clone()),
                    ])
                    .style(alt(idx))
                })
                .collect();
            Table::new(
                rows,
                [
                    Constraint::Length(10),
                    Constraint::Length(12),
                    Constraint::Length(6),
                    Constraint::Length(8),
                    Constraint::Fill(1),
                ],
            )
            .header(Row::new(vec!["ID", "Price", "Rating", "Reviews", "Title"]).style(t.header_style))
            .block(Block::bordered().title(format!(
                " Products ({}) | p: customers ",
                snapshot.data.products.len()
            )))
        }
    }
    .row_highlight_style(t.row_selected);

    frame.render_stateful_widget(table, area, &mut app.data_state);
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let t = &app.theme;
    let text = if let Some((ref msg, _)) = app.flash_message {
        let msg_color = if msg.starts_with("Failed") || msg.contains("timed out") {
            t.flash_error
        } else if msg.starts_with("Refreshed") {
            t.flash_success
        } else {
            t.status_key_color
        };
        Line::from(Span::styled(msg.clone(), Style::default().fg(msg_color)))
    } else {
        let elapsed = app.last_refresh.elapsed();
        let refresh_time = if elapsed.as_secs() < 60 {
            format!("refreshed {}s ago", elapsed.as_secs())
        } else {
            format!("refreshed {}m ago", elapsed.as_secs() / 60)
        };

        let mut hints = vec![("Tab", ":page "), ("r", ":reload "), ("?", ":help "), ("q", ":quit")];
        match app.page {
            Page::Recommendations => {
                hints.insert(0, ("j/k", ":customer "));
                hints.insert(1, ("b", ":breakdown "));
            }
            Page::Data => {
                hints.insert(0, ("j/k", ":row "));
                hints.insert(1, ("p", ":switch table "));
            }
            _ => {}
        }

        let mut spans = vec![
            Span::styled(refresh_time, Style::default().fg(t.muted)),
            Span::raw("  "),
        ];
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::raw(" "));
            }
            spans.push(Span::styled(*key, Style::default().fg(t.status_key_color)));
            spans.push(Span::raw(*label));
        }
        Line::from(spans)
    };

    frame.render_widget(
        Paragraph::new(text).style(Style::default().bg(t.status_bar_bg)),
        area,
    );
}

/// Create a centered rectangle with fixed width and height
fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}

fn render_help_popup(frame: &mut Frame, t: &ThemeColors) {
    let popup_area = centered_rect_fixed(52, 15, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered()
        .title(Span::styled(" Keyboard Shortcuts ", t.popup_title))
        .border_style(Style::default().fg(t.popup_border));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let key = |k: &'static str| Span::styled(format!("{:<16}", k), Style::default().fg(t.status_key_color).bold());
    let help_lines = vec![
        Line::from(vec![key("Tab / Shift-Tab"), Span::raw("Next / previous page")]),
        Line::from(vec![key("j / Down"), Span::raw("Next customer or row")]),
        Line::from(vec![key("k / Up"), Span::raw("Previous customer or row")]),
        Line::from(vec![key("b"), Span::raw("Score breakdown of top pick")]),
        Line::from(vec![key("p"), Span::raw("Customers / products (Data)")]),
        Line::from(vec![key("r"), Span::raw("Reload data (bypasses cache)")]),
        Line::from(vec![key("?"), Span::raw("Show/hide this help")]),
        Line::from(vec![key("q / Ctrl-c"), Span::raw("Quit")]),
        Line::from(""),
        Line::from(Span::styled("Price in green: inside the budget", Style::default().fg(t.muted))),
        Line::from(Span::styled("Bold title: keyword match", Style::default().fg(t.muted))),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(t.muted))),
    ];
    frame.render_widget(Paragraph::new(help_lines), inner);
}

fn render_breakdown_popup(frame: &mut Frame, app: &App) {
    let t = &app.theme;
    let Some((customer, rec)) = app.selected_recommendation() else {
        return;
    };
    let Some(top) = rec.top() else {
        return;
    };
    let b = &top.result.breakdown;

    let popup_area = centered_rect_fixed(60, 13, frame.area());
    frame.render_widget(Clear, popup_area);
    let block = Block::bordered()
        .title(Span::styled(" Score Breakdown ", t.popup_title))
        .border_style(Style::default().fg(t.popup_border));
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let lines = vec![
        Line::from(Span::styled(truncate_title(&top.product.title, 56), Style::default().bold())),
        Line::from(format!(
            "for {} (budget {} - {})",
            customer.id,
            format_price(customer.budget_low),
            format_price(customer.budget_high)
        )),
        Line::from(""),
        stat_line("Price", format_price(top.product.price), t),
        stat_line("Budget midpoint", format_price(b.mid_price), t),
        stat_line("Distance from mid", format!("{:.4}", b.price_distance), t),
        stat_line("Price penalty", format!("-{:.4}", b.price_penalty), t),
        stat_line("Popularity", format!("+{:.4}", b.popularity), t),
        stat_line("Score", format_score(top.score()), t),
        Line::from(""),
        Line::from(Span::styled("Esc or b to close", Style::default().fg(t.muted))),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_loading_overlay(frame: &mut Frame, app: &App) {
    let popup_area = centered_rect_fixed(30, 3, frame.area());
    frame.render_widget(Clear, popup_area);

    let block = Block::bordered();
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    // Braille spinner animation
    let spinner_chars = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let text = if app.snapshot.is_none() {
        format!("{} Loading market data...", spinner)
    } else {
        format!("{} Reloading...", spinner)
    };

    let loading_text = Paragraph::new(text)
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.title_color));
    frame.render_widget(loading_text, inner);
}
