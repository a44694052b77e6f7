//! Fixed category catalogue for the marketplace.
//!
//! The browse filter and the listing form read the same constant. Listings
//! store the label verbatim; nothing validates a submitted category against
//! this list, so an off-catalogue category is stored as-is and simply never
//! matched by the filter links.

/// All marketplace categories, in display order.
///
/// The labels are Traditional Chinese, from vehicles and home rental
/// through to buy/sell groups.
pub const CATEGORIES: &[&str] = &[
    "車輛",
    "房屋租賃",
    "免費商品",
    "分類廣告",
    "嗜好",
    "園藝和戶外用品",
    "娛樂",
    "家庭",
    "寵物用品",
    "居家用品",
    "居家裝潢用品",
    "房屋銷售",
    "服飾",
    "樂器",
    "玩具和遊戲",
    "辦公用品",
    "運動用品",
    "電子產品",
    "商品買賣社團",
];
