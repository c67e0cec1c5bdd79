/// 从页面路径推导来源标识
///
/// 取路径最后一段,去掉 `.html` 后缀并转大写;
/// 空路径或以 `/` 结尾时为 `INDEX`。
///
/// 例: `/pages/presenter-home.html` → `PRESENTER-HOME`
pub fn source_from_path(path: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let page = path.rsplit('/').next().unwrap_or_default();
    let page = if page.is_empty() { "index.html" } else { page };
    page.replacen(".html", "", 1).to_uppercase()
}
