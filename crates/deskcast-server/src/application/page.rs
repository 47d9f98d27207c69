//! The viewer page served at `/`, `/display` and `/index.html`.
//!
//! A single image element pulls `/stream`.  Pointer and key events on the
//! page are POSTed to `/input` as JSON without waiting for, or looking at,
//! the response.  Pointer moves are throttled to one per 30 ms.  If the
//! stream drops, the page re-requests it after a second.

/// The complete HTML document, scripts inline.
pub const VIEWER_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>deskcast</title>
<style>
  html, body { margin: 0; height: 100%; background: #111; overflow: hidden; }
  #screen {
    display: block; width: 100%; height: 100%;
    object-fit: contain; cursor: crosshair;
    user-select: none; -webkit-user-select: none; outline: none;
  }
</style>
</head>
<body>
<img id="screen" src="/stream" alt="remote display" tabindex="0" draggable="false">
<script>
(function () {
  var img = document.getElementById('screen');
  var MOVE_INTERVAL_MS = 30;
  var lastMove = 0;

  function send(payload) {
    fetch('/input', {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify(payload)
    }).catch(function () {});
  }

  // object-fit: contain letterboxes the image; map into the drawn area.
  function normalize(e) {
    var r = img.getBoundingClientRect();
    var iw = img.naturalWidth || r.width;
    var ih = img.naturalHeight || r.height;
    var scale = Math.min(r.width / iw, r.height / ih);
    var dw = iw * scale, dh = ih * scale;
    var ox = r.left + (r.width - dw) / 2;
    var oy = r.top + (r.height - dh) / 2;
    return { x: (e.clientX - ox) / dw, y: (e.clientY - oy) / dh };
  }

  img.addEventListener('mousemove', function (e) {
    var now = Date.now();
    if (now - lastMove < MOVE_INTERVAL_MS) { return; }
    lastMove = now;
    var p = normalize(e);
    send({ type: 'move', x: p.x, y: p.y });
  });

  function click(down) {
    return function (e) {
      e.preventDefault();
      img.focus();
      var p = normalize(e);
      send({ type: 'click', x: p.x, y: p.y, button: e.button, down: down });
    };
  }
  img.addEventListener('mousedown', click(true));
  img.addEventListener('mouseup', click(false));
  img.addEventListener('contextmenu', function (e) { e.preventDefault(); });

  function key(down) {
    return function (e) {
      e.preventDefault();
      send({ type: 'key', keyCode: e.keyCode, down: down });
    };
  }
  document.addEventListener('keydown', key(true));
  document.addEventListener('keyup', key(false));

  img.addEventListener('error', function () {
    setTimeout(function () { img.src = '/stream?t=' + Date.now(); }, 1000);
  });
})();
</script>
</body>
</html>
"#;
