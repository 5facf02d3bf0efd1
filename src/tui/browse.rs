//! Category picker shown before searching with `--browse`.

use std::sync::Arc;

use crossterm::event;

use crate::columns::DisplayList;
use crate::error::Result;
use crate::feed::{Category, parse_caps};
use crate::list::ListModel;
use crate::render::RenderCommand;
use crate::search::{SearchRequest, api_url};
use crate::session::Session;

use super::input::{Action, action_for};
use super::list_command;

/// Comma-separated ids of the marked categories, in list order.
#[must_use]
pub fn selected_ids(categories: &[Category], model: &ListModel) -> String {
    model
        .selected_indices()
        .filter_map(|i| categories.get(i).map(|c| c.id.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Fetches the server's categories and lets the user mark some.
///
/// Returns the chosen ids (possibly empty), or `None` if the user quit.
///
/// # Errors
///
/// Returns an error if the caps document cannot be fetched or parsed, or
/// the terminal fails.
pub fn choose_categories(session: &Session, request: &SearchRequest) -> Result<Option<String>> {
    let queue = session.queue();
    queue.enqueue(RenderCommand::Wait("Retrieving Category List".into()));

    let url = api_url(
        &request.base_url,
        [("t", "caps"), ("apikey", request.params.api_key.as_str())],
    )?;
    let body = session.fetcher().fetch(&url)?;
    let categories = parse_caps(&body)?;
    log::info!("Server offers {} categories", categories.len());

    queue.enqueue(RenderCommand::ShowList(Arc::new(DisplayList::for_categories(
        &categories,
    ))));
    queue.enqueue(RenderCommand::Header(format!(
        "{:03} Categories",
        categories.len()
    )));
    queue.status("");
    queue.enqueue(RenderCommand::Footer(
        "Press 'Q' to quit,  'Space' to select,  'Enter' to choose".into(),
    ));
    queue.enqueue(RenderCommand::RedrawAll);

    loop {
        let Some(action) = action_for(&event::read()?) else {
            continue;
        };
        match action {
            Action::Quit => return Ok(None),
            Action::Retrieve => {
                queue.flush();
                let ids = selected_ids(&categories, &session.model());
                log::info!("Chosen categories: {ids:?}");
                queue.status("");
                return Ok(Some(ids));
            }
            Action::Requeue => {}
            other => {
                if let Some(command) = list_command(other) {
                    queue.enqueue(command);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: &str) -> Category {
        Category {
            id: id.into(),
            name: id.into(),
            is_subcategory: false,
        }
    }

    #[test]
    fn ids_follow_list_order() {
        let categories = [category("2000"), category("2040"), category("5000")];
        let mut model = ListModel::new(10);
        model.reset(3);
        model.toggle_select(2);
        model.toggle_select(0);
        assert_eq!(selected_ids(&categories, &model), "2000,5000");
    }

    #[test]
    fn nothing_marked_gives_empty_ids() {
        let mut model = ListModel::new(10);
        model.reset(1);
        assert_eq!(selected_ids(&[category("1")], &model), "");
    }
}
