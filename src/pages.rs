//! Server-side HTML rendering
//!
//! Pages are built as plain strings and handed to axum as `Html`. All
//! user-entered text goes through [`escape_html`] before it reaches the
//! markup; stored upload names are ASCII-safe already but are escaped the
//! same way. The stylesheet is embedded at compile time.

use crate::categories::CATEGORIES;
use crate::database::Item;

/// Escape text for embedding in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Wrap page content in the shared document shell.
fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"zh-Hant\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{} - 二手市集</title>\n\
         <style>{}</style>\n\
         </head>\n\
         <body>\n\
         <header><a href=\"/\" class=\"brand\">二手市集</a></header>\n\
         <main>\n{}</main>\n\
         </body>\n\
         </html>\n",
        escape_html(title),
        include_str!("../static/style.css"),
        body
    )
}

fn category_options(selected: &str) -> String {
    let mut options = String::new();
    for category in CATEGORIES {
        let marker = if *category == selected {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>\n",
            escape_html(category),
            marker
        ));
    }
    options
}

fn item_photo(item: &Item) -> String {
    if item.image.is_empty() {
        "<div class=\"no-photo\">無照片</div>".to_string()
    } else {
        format!(
            "<img src=\"/uploads/{0}\" alt=\"{1}\">",
            escape_html(&item.image),
            escape_html(&item.content)
        )
    }
}

/// Browse page: search form, category links, and the matching listings.
pub fn index_page(items: &[Item], q: &str, category: &str) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "<form method=\"get\" action=\"/\" class=\"search\">\n\
         <input type=\"text\" name=\"q\" value=\"{}\" placeholder=\"搜尋商品\">\n\
         <select name=\"category\">\n\
         <option value=\"\">全部分類</option>\n{}</select>\n\
         <button type=\"submit\">搜尋</button>\n\
         <a href=\"/add\" class=\"add-link\">刊登商品</a>\n\
         </form>\n",
        escape_html(q),
        category_options(category)
    ));

    body.push_str("<nav class=\"categories\">\n<a href=\"/\">全部</a>\n");
    for label in CATEGORIES {
        body.push_str(&format!(
            "<a href=\"/?category={}\">{}</a>\n",
            urlencoding::encode(label),
            escape_html(label)
        ));
    }
    body.push_str("</nav>\n");

    if items.is_empty() {
        body.push_str("<p class=\"empty\">目前沒有符合的商品</p>\n");
    } else {
        body.push_str("<ul class=\"items\">\n");
        for item in items {
            body.push_str(&format!(
                "<li class=\"item\">\n\
                 <a href=\"/item/{id}\">{photo}</a>\n\
                 <h2><a href=\"/item/{id}\">{content}</a></h2>\n\
                 <p class=\"store\">{store}</p>\n\
                 <p class=\"price\">{price}</p>\n\
                 <p class=\"category\">{category}</p>\n\
                 <a href=\"/delete/{id}\" class=\"delete\">刪除</a>\n\
                 </li>\n",
                id = item.id,
                photo = item_photo(item),
                content = escape_html(&item.content),
                store = escape_html(&item.store),
                price = escape_html(&item.price),
                category = escape_html(&item.category),
            ));
        }
        body.push_str("</ul>\n");
    }

    layout("首頁", &body)
}

/// Listing creation form.
pub fn add_item_page() -> String {
    let body = format!(
        "<h1>刊登商品</h1>\n\
         <form method=\"post\" action=\"/add\" enctype=\"multipart/form-data\" class=\"add-form\">\n\
         <label>商品說明 <input type=\"text\" name=\"content\"></label>\n\
         <label>賣家 / 店家 <input type=\"text\" name=\"store\"></label>\n\
         <label>價格 <input type=\"text\" name=\"price\"></label>\n\
         <label>分類 <select name=\"category\">\n{}</select></label>\n\
         <label>商品照片 <input type=\"file\" name=\"image\"></label>\n\
         <button type=\"submit\">刊登</button>\n\
         </form>\n\
         <p><a href=\"/\">回首頁</a></p>\n",
        category_options("")
    );

    layout("刊登商品", &body)
}

/// Listing detail plus the purchase inquiry form.
pub fn item_detail_page(item: &Item) -> String {
    let body = format!(
        "<article class=\"detail\">\n\
         {photo}\n\
         <h1>{content}</h1>\n\
         <p class=\"store\">賣家：{store}</p>\n\
         <p class=\"price\">價格：{price}</p>\n\
         <p class=\"category\">分類：{category}</p>\n\
         </article>\n\
         <section class=\"buy\">\n\
         <h2>我要購買</h2>\n\
         <form method=\"post\" action=\"/buy/{id}\">\n\
         <label>所在地 <input type=\"text\" name=\"location\"></label>\n\
         <label>聯絡電話 <input type=\"text\" name=\"phone\"></label>\n\
         <label>電子郵件 <input type=\"text\" name=\"email\"></label>\n\
         <button type=\"submit\">送出購買資訊</button>\n\
         </form>\n\
         </section>\n\
         <p><a href=\"/\">回首頁</a></p>\n",
        photo = item_photo(item),
        content = escape_html(&item.content),
        store = escape_html(&item.store),
        price = escape_html(&item.price),
        category = escape_html(&item.category),
        id = item.id,
    );

    layout(&item.content, &body)
}

/// Confirmation page shown after an inquiry is recorded.
pub fn order_success_page() -> String {
    let body = "<h1>下單成功</h1>\n\
                <p>已收到您的購買資訊，賣家將透過您留下的聯絡方式與您聯繫。</p>\n\
                <p><a href=\"/\">回首頁</a></p>\n";

    layout("下單成功", body)
}
