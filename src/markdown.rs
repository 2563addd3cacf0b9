//! Stitch per-page OCR output into one Markdown document.

use crate::ocr::OcrPage;

/// Replace `![id](id)` placeholders with `![id](<base64>)`.
///
/// Plain substring replacement: any identical text elsewhere on the page is
/// replaced too.
pub fn replace_images_in_markdown<'a, I>(markdown: &str, images: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = markdown.to_string();
    for (id, base64) in images {
        let placeholder = format!("![{id}]({id})");
        let inlined = format!("![{id}]({base64})");
        out = out.replace(&placeholder, &inlined);
    }
    out
}

/// Join all pages, in order, separated by one blank line.
pub fn combine_pages(pages: &[OcrPage]) -> String {
    pages
        .iter()
        .map(|page| {
            replace_images_in_markdown(
                &page.markdown,
                page.images
                    .iter()
                    .filter_map(|img| Some((img.id.as_str(), img.image_base64.as_deref()?))),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
