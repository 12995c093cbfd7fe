use crate::feed::html::truncate_chars;
use crate::models::{Language, NewsItem};

/// Items beyond this are left out of the prompt.
pub const MAX_PROMPT_ITEMS: usize = 20;

/// Per-item body preview, in characters.
pub const PREVIEW_CHARS: usize = 500;

const ZH_TEMPLATE: &str = r#"请根据以下AI行业新闻的标题和内容，生成一份简洁的今日AI行业动态概要（200-300字），并使用HTML格式输出：

{news}

要求：
1. 概括今日AI行业的主要动态和趋势
2. 语言简洁、专业、流畅，突出重要新闻和行业变化
3. 只使用以下HTML标签：
   - <p> 包裹段落
   - <strong> 突出重要信息
   - <h3> 作为小标题（如需分类）
   - <ul> 和 <li> 组织列表（如需）
4. 每段表达一个主题，开头用一句话总括

参考结构：
<p>今日AI行业的整体动向是<strong>[主要趋势]</strong>。</p>
<h3>技术进展</h3>
<p>[关键技术新闻及其细节]。</p>
<h3>落地应用</h3>
<p>[应用相关新闻]，这说明[简要分析]。</p>
<h3>产业格局</h3>
<p>[公司、资本与政策相关新闻]，反映出[趋势判断]。</p>

请直接输出HTML代码，不要包含markdown格式或其他说明文字。"#;

const EN_TEMPLATE: &str = r#"Based on the following AI industry news titles and content, write a concise summary (200-300 words) of today's AI industry updates, formatted as HTML:

{news}

Requirements:
1. Summarize the main developments and trends in today's AI industry
2. Use concise, professional, fluent language and highlight the most important changes
3. Use only these HTML tags:
   - <p> to wrap paragraphs
   - <strong> to emphasize key information
   - <h3> for subheadings (if grouping helps)
   - <ul> and <li> for lists (if needed)
4. One theme per paragraph, opening with a one-sentence overview

Suggested structure:
<p>The overall direction in AI today is <strong>[main trend]</strong>.</p>
<h3>Research and Models</h3>
<p>[Key technical news and its details].</p>
<h3>Products and Adoption</h3>
<p>[Application news], which suggests [brief analysis].</p>
<h3>Industry Landscape</h3>
<p>[Company, funding and policy news], reflecting [trend assessment].</p>

Output the HTML directly, without markdown fences or any other explanatory text."#;

/// Build the daily-summary prompt for `language` from today's items.
pub fn build_prompt(news: &[NewsItem], language: Language) -> String {
    let (title_label, content_label, template) = match language {
        Language::Zh => ("标题：", "内容：", ZH_TEMPLATE),
        Language::En => ("Title: ", "Content: ", EN_TEMPLATE),
    };

    let listing = news
        .iter()
        .take(MAX_PROMPT_ITEMS)
        .enumerate()
        .map(|(i, item)| {
            let mut entry = format!("{}. {title_label}{}", i + 1, item.title);
            let preview = truncate_chars(item.body(), PREVIEW_CHARS);
            if !preview.is_empty() {
                entry.push_str(&format!("\n   {content_label}{preview}"));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    template.replace("{news}", &listing)
}
