use sagechat_store::HistorySummary;
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

use crate::dom;
use crate::utils::escape_html;

/// Redraw the history list. Clicks are handled by delegation on the
/// container, keyed by each card's `data-id` and each button's `data-action`.
pub fn render_histories(document: &Document, summaries: &[HistorySummary]) -> Result<(), JsValue> {
    let container = dom::get_element_by_id(document, "historyList")?;
    dom::clear_element(&container);

    if summaries.is_empty() {
        let empty_msg = document.create_element("div")?;
        empty_msg.set_class_name("empty-state");
        empty_msg.set_text_content(Some("暂无对话"));
        container.append_child(&empty_msg)?;
        return Ok(());
    }

    for summary in summaries {
        let card = create_history_card(document, summary)?;
        container.append_child(&card)?;
    }

    Ok(())
}

fn create_history_card(document: &Document, summary: &HistorySummary) -> Result<Element, JsValue> {
    let card = document.create_element("div")?;
    let mut class = String::from("history-card");
    if summary.is_active {
        class.push_str(" active");
    }
    if summary.is_starred {
        class.push_str(" starred");
    }
    card.set_class_name(&class);
    card.set_attribute("data-id", &summary.id)?;
    card.set_attribute("data-action", "select")?;

    let star = if summary.is_starred { "★" } else { "☆" };
    let html = format!(
        r#"
        <div class="history-header">
            <span class="history-title">{}</span>
            <span class="history-actions">
                <button data-action="star" title="收藏">{}</button>
                <button data-action="rename" title="重命名">✎</button>
                <button data-action="export" title="导出">⇩</button>
                <button data-action="delete" title="删除">✕</button>
            </span>
        </div>
        <div class="history-preview">{}</div>
        <div class="history-meta">{} · {} 条消息</div>
        "#,
        escape_html(&summary.title),
        star,
        escape_html(&summary.preview),
        summary.created_at,
        summary.message_count
    );
    card.set_inner_html(&html);

    Ok(card)
}
