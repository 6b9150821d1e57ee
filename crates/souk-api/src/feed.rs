// SPDX-License-Identifier: Apache-2.0

//! Shopping feed renderer: RSS 2.0 with the Google `g:` namespace, the
//! shape Google Merchant and Meta catalogs both ingest. Served by the
//! server at `/feed/products.xml` and written to disk by the CLI.

use souk_store::products::FeedEntry;

/// Zero-stock products are left out; the feed advertises what a buyer can
/// actually order. Products without a vendor are branded as the store.
#[must_use]
pub fn render_feed(
    entries: &[FeedEntry],
    store_name: &str,
    public_base_url: &str,
    currency: &str,
) -> String {
    let base = public_base_url.trim_end_matches('/');
    let mut xml = String::with_capacity(512 + entries.len() * 512);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\" xmlns:g=\"http://base.google.com/ns/1.0\">\n");
    xml.push_str("<channel>\n");
    push_tag(&mut xml, "title", store_name);
    push_tag(&mut xml, "link", base);
    push_tag(&mut xml, "description", &format!("{store_name} product feed"));
    for entry in entries {
        if entry.product.stock == 0 {
            continue;
        }
        xml.push_str("<item>\n");
        push_tag(&mut xml, "g:id", &entry.product.id.to_string());
        push_tag(&mut xml, "title", &entry.product.name);
        if let Some(description) = &entry.product.description {
            push_tag(&mut xml, "description", description);
        }
        push_tag(
            &mut xml,
            "link",
            &format!("{base}/product/{}", entry.product.slug),
        );
        if let Some(image) = entry.product.media.first() {
            push_tag(&mut xml, "g:image_link", image);
        }
        push_tag(
            &mut xml,
            "g:price",
            &format!("{} {currency}", entry.product.selling_price),
        );
        push_tag(&mut xml, "g:availability", "in_stock");
        push_tag(&mut xml, "g:condition", "new");
        push_tag(
            &mut xml,
            "g:brand",
            entry.vendor_name.as_deref().unwrap_or(store_name),
        );
        push_tag(&mut xml, "g:product_type", &entry.category_name);
        xml.push_str("</item>\n");
    }
    xml.push_str("</channel>\n</rss>\n");
    xml
}

fn push_tag(xml: &mut String, tag: &str, value: &str) {
    xml.push('<');
    xml.push_str(tag);
    xml.push('>');
    xml.push_str(&xml_escape(value));
    xml.push_str("</");
    xml.push_str(tag);
    xml.push_str(">\n");
}

fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
