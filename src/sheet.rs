//! Buyer-facing property page for a listing.
//!
//! The assignment fee, the purchase price and the purchase agreement are the seller's
//! business and never appear on the page.

use std::fmt::Write;

use crate::finance::money::{format_currency, format_percent};
use crate::models::{ListingRow, ListingStatus};

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:960px;margin:0 auto;padding:1.5rem;color:#1f2328}\
.banner{background:#fff8c5;border:1px solid #d4a72c;padding:.5rem 1rem;border-radius:6px}\
.price{font-size:2rem;font-weight:700;color:#1a7f37}\
.facts span{margin-right:1rem}\
.gallery img{width:30%;margin:.25rem;border-radius:4px}\
table{border-collapse:collapse}td,th{padding:.25rem .75rem;text-align:left}";

/// Escape text for use in HTML content and attribute values
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the standalone marketing page for a listing
pub fn render_listing_sheet(listing: &ListingRow) -> String {
    let mut html = String::new();
    let address = escape_html(&listing.address);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", address);
    let _ = writeln!(html, "<style>{}</style>\n</head>\n<body>", STYLE);

    if listing.status == ListingStatus::Draft {
        html.push_str("<p class=\"banner\" id=\"draft-banner\">Draft preview. This listing is not visible to buyers.</p>\n");
    }

    let _ = writeln!(html, "<header>\n<h1 id=\"address\">{}</h1>", address);
    let _ = writeln!(html, "<p id=\"locality\">{}</p>", escape_html(&listing.locality()));
    if let Some(price) = listing.listing_price {
        let _ = writeln!(html, "<p class=\"price\" id=\"price\">{}</p>", format_currency(price));
    }
    html.push_str("</header>\n");

    html.push_str("<section class=\"facts\" id=\"facts\">\n");
    if !listing.property_type.is_empty() {
        let _ = writeln!(html, "<span>{}</span>", escape_html(&listing.property_type));
    }
    if let Some(beds) = listing.bedrooms {
        let _ = writeln!(html, "<span>{} bd</span>", beds);
    }
    if let Some(baths) = listing.bathrooms {
        let _ = writeln!(html, "<span>{} ba</span>", baths);
    }
    if let Some(sqft) = listing.square_footage {
        let _ = writeln!(html, "<span>{} sqft</span>", group_digits(sqft));
    }
    if let Some(year) = listing.year_built {
        let _ = writeln!(html, "<span>Built {}</span>", year);
    }
    html.push_str("</section>\n");

    if let Some(primary) = &listing.primary_image {
        let _ = writeln!(
            html,
            "<img id=\"primary-image\" src=\"{}\" alt=\"{}\">",
            escape_html(&primary.url),
            address
        );
    }
    if !listing.gallery.is_empty() {
        html.push_str("<section class=\"gallery\" id=\"gallery\">\n");
        for (i, image) in listing.gallery.iter().enumerate() {
            let _ = writeln!(
                html,
                "<img src=\"{}\" alt=\"Photo {}\">",
                escape_html(&image.url),
                i + 1
            );
        }
        html.push_str("</section>\n");
    }
    if let Some(video) = &listing.video {
        let _ = writeln!(
            html,
            "<video id=\"video\" controls src=\"{}\"></video>",
            escape_html(&video.url)
        );
    }

    if !listing.description.trim().is_empty() {
        let _ = writeln!(
            html,
            "<section id=\"description\">\n<h2>About this property</h2>\n<p>{}</p>\n</section>",
            escape_html(listing.description.trim())
        );
    }

    let figures = investor_figures(listing);
    if !figures.is_empty() {
        html.push_str("<section id=\"investor\">\n<h2>Investor figures</h2>\n<table>\n");
        for (label, value) in figures {
            let _ = writeln!(html, "<tr><th>{}</th><td>{}</td></tr>", label, value);
        }
        html.push_str("</table>\n</section>\n");
    }

    if listing.access_type.is_some() || listing.closing_date.is_some() {
        html.push_str("<section id=\"logistics\">\n<h2>Showing &amp; closing</h2>\n<ul>\n");
        if let Some(access) = listing.access_type {
            let _ = writeln!(html, "<li>Access: {}</li>", access.label());
        }
        if !listing.access_notes.trim().is_empty() {
            let _ = writeln!(html, "<li>{}</li>", escape_html(listing.access_notes.trim()));
        }
        if let Some(date) = listing.closing_date {
            let _ = writeln!(html, "<li>Closing by {}</li>", date.format("%B %-d, %Y"));
        }
        html.push_str("</ul>\n</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn investor_figures(listing: &ListingRow) -> Vec<(&'static str, String)> {
    let mut figures = Vec::new();
    if let Some(arv) = listing.arv {
        figures.push(("After-repair value", format_currency(arv)));
    }
    if listing.repair_total > 0.0 {
        figures.push(("Estimated repairs", format_currency(listing.repair_total)));
    }
    let gross_rent: f64 = crate::finance::gross_annual_rent(&listing.rent_roll);
    if gross_rent > 0.0 {
        figures.push(("Gross rent (annual)", format_currency(gross_rent)));
    }
    if listing.annual_expenses > 0.0 {
        figures.push(("Expenses (monthly)", format_currency(listing.monthly_expenses)));
        figures.push(("Expenses (annual)", format_currency(listing.annual_expenses)));
    }
    if let Some(cap_rate) = listing.cap_rate {
        figures.push(("Cap rate", format_percent(cap_rate)));
    }
    figures
}

fn group_digits(value: u32) -> String {
    format_currency(f64::from(value)).trim_start_matches('$').to_string()
}
