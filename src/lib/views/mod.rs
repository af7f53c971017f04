//! HTML views.
//!
//! Page renderers wrap the fragment renderers in a shared layout. The
//! fragments are also what the broadcaster pushes, so a live page can swap
//! them in place without a reload.

use std::fmt::Write;

use crate::adapters::session::Flash;
use crate::core::Todo;

pub const LIST_CONTAINER_ID: &str = "todo-list";
pub const DETAIL_CONTAINER_ID: &str = "todo-detail";

const DONE_LABEL: &str = "hotovo";
const NOT_DONE_LABEL: &str = "nehotovo";

const LIVE_SCRIPT: &str = r#"<script>
(function () {
  var scheme = location.protocol === "https:" ? "wss://" : "ws://";
  var socket = new WebSocket(scheme + location.host + "/ws");
  socket.addEventListener("message", function (event) {
    var msg = JSON.parse(event.data);
    if (msg.type === "todo_list") {
      var list = document.getElementById("__LIST_ID__");
      if (list) list.innerHTML = msg.html;
      return;
    }
    var detail = document.getElementById("__DETAIL_ID__");
    if (!detail || Number(detail.dataset.id) !== msg.id) return;
    if (msg.type === "todo_detail") detail.innerHTML = msg.html;
    if (msg.type === "todo_deleted") location.href = "/";
  });
})();
</script>"#;

/// Escapes text for use in element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The push listener, pointed at the same containers the pages render.
fn live_script() -> String {
    LIVE_SCRIPT
        .replace("__LIST_ID__", LIST_CONTAINER_ID)
        .replace("__DETAIL_ID__", DETAIL_CONTAINER_ID)
}

fn state_label(todo: &Todo) -> &'static str {
    if todo.done { DONE_LABEL } else { NOT_DONE_LABEL }
}

fn layout(title: &str, flashes: &[Flash], content: &str) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"cs\">");
    let _ = writeln!(
        html,
        "<head><meta charset=\"utf-8\"><title>{}</title></head>",
        escape_html(title)
    );
    let _ = writeln!(html, "<body>");
    if !flashes.is_empty() {
        let _ = writeln!(html, "<ul class=\"flash\">");
        for flash in flashes {
            let _ = writeln!(
                html,
                "  <li class=\"flash-{}\">{}</li>",
                escape_html(&flash.kind),
                escape_html(&flash.message)
            );
        }
        let _ = writeln!(html, "</ul>");
    }
    html.push_str(content);
    let _ = writeln!(html, "{}", live_script());
    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

/// Inner HTML of the list container.
pub fn render_list_fragment(todos: &[Todo]) -> String {
    let mut html = String::new();
    if todos.is_empty() {
        let _ = writeln!(html, "<p class=\"empty\">Žádná todo</p>");
        return html;
    }
    let _ = writeln!(html, "<ul>");
    for todo in todos {
        let _ = writeln!(
            html,
            "  <li data-id=\"{id}\"><a href=\"/todo/{id}\">{title}</a> \
             <span class=\"state\">{state}</span> \
             <a href=\"/toggle-todo/{id}\">přepnout</a> \
             <a href=\"/remove-todo/{id}\">odebrat</a></li>",
            id = todo.id,
            title = escape_html(&todo.title),
            state = state_label(todo),
        );
    }
    let _ = writeln!(html, "</ul>");
    html
}

/// Inner HTML of the detail container, including the edit form.
pub fn render_detail_fragment(todo: &Todo) -> String {
    let priority = todo.priority.as_deref().unwrap_or("");
    let mut html = String::new();
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(&todo.title));
    let _ = writeln!(
        html,
        "<p>Priorita: <span class=\"priority\">{}</span></p>",
        if priority.is_empty() { "-".to_string() } else { escape_html(priority) }
    );
    let _ = writeln!(html, "<p>Stav: <span class=\"state\">{}</span></p>", state_label(todo));
    let _ = writeln!(
        html,
        "<p><a href=\"/toggle-todo/{id}\">přepnout</a> <a href=\"/remove-todo/{id}\">odebrat</a></p>",
        id = todo.id
    );
    let _ = writeln!(html, "<form method=\"post\" action=\"/update-todo/{}\">", todo.id);
    let _ = writeln!(
        html,
        "  <input type=\"text\" name=\"title\" value=\"{}\">",
        escape_html(&todo.title)
    );
    let _ = writeln!(
        html,
        "  <input type=\"text\" name=\"priority\" value=\"{}\">",
        escape_html(priority)
    );
    let _ = writeln!(html, "  <button type=\"submit\">Uložit</button>");
    let _ = writeln!(html, "</form>");
    html
}

pub fn render_index(title: &str, todos: &[Todo], flashes: &[Flash]) -> String {
    let mut content = String::new();
    let _ = writeln!(content, "<h1>{}</h1>", escape_html(title));
    let _ = writeln!(content, "<form method=\"post\" action=\"/add-todo\">");
    let _ = writeln!(content, "  <input type=\"text\" name=\"title\">");
    let _ = writeln!(content, "  <button type=\"submit\">Přidat</button>");
    let _ = writeln!(content, "</form>");
    let _ = writeln!(
        content,
        "<div id=\"{LIST_CONTAINER_ID}\">\n{}</div>",
        render_list_fragment(todos)
    );
    layout(title, flashes, &content)
}

pub fn render_detail(todo: &Todo, flashes: &[Flash]) -> String {
    let mut content = String::new();
    let _ = writeln!(content, "<p><a href=\"/\">Zpět na seznam</a></p>");
    let _ = writeln!(
        content,
        "<div id=\"{DETAIL_CONTAINER_ID}\" data-id=\"{}\">\n{}</div>",
        todo.id,
        render_detail_fragment(todo)
    );
    layout(&todo.title, flashes, &content)
}
