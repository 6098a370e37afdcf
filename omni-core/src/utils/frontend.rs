//! Control page served at `/`.
//!
//! Button and joystick driving, speed and mode, per-wheel mapping, inversion
//! and test controls. The page keeps the socket alive with the server's
//! heartbeat token while idle.

pub const HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Omni Robot</title>
<style>
body { font-family: sans-serif; text-align: center; background: #202428; color: #eee; }
button { width: 5.5em; height: 3em; margin: 0.2em; font-size: 1em; }
#pad { width: 240px; height: 240px; margin: 1em auto; border-radius: 50%; background: #333a40; position: relative; touch-action: none; }
#knob { width: 60px; height: 60px; border-radius: 50%; background: #8ab4f8; position: absolute; left: 90px; top: 90px; }
table { margin: 0 auto; }
td { padding: 0.2em 0.5em; }
td button { width: 3.5em; height: 2.2em; }
#config { font-family: monospace; white-space: pre; }
.hidden { display: none; }
</style>
</head>
<body>
<h2>Omni Robot</h2>
<p><button id="showButtons">buttons</button><button id="showJoystick">joystick</button></p>
<div id="buttons">
  <button data-hold="diag_fl">&#8598;</button><button data-hold="forward">&#8593;</button><button data-hold="diag_fr">&#8599;</button><br>
  <button data-hold="left">&#8592;</button><button data-cmd="stop">stop</button><button data-hold="right">&#8594;</button><br>
  <button data-hold="diag_bl">&#8601;</button><button data-hold="backward">&#8595;</button><button data-hold="diag_br">&#8600;</button><br>
  <button data-hold="rotate_left">&#8634;</button><button data-hold="rotate_right">&#8635;</button>
</div>
<div id="joystick" class="hidden"><div id="pad"><div id="knob"></div></div></div>
<p>speed <input id="speed" type="range" min="0" max="255" value="200"></p>
<p><button data-cmd="mode_omni">omni</button><button data-cmd="mode_tank">tank</button></p>
<h3>Wheels</h3>
<table id="wheels">
  <tr><th>position</th><th>motor</th><th>invert</th><th>test</th></tr>
</table>
<p>
  <button data-cmd="get_config">read</button><button data-cmd="save_config">save</button><button data-cmd="reset_config">reset</button>
</p>
<div id="config"></div>
<script>
const ws = new WebSocket(`ws://${location.host}/ws`);
const send = (t) => { if (ws.readyState === 1) ws.send(t); };
const $ = (id) => document.getElementById(id);

const names = ['front right', 'front left', 'rear left', 'rear right'];
const table = $('wheels');
names.forEach((name, pos) => {
  const row = table.insertRow();
  row.insertCell().textContent = `${pos}: ${name}`;
  const map = document.createElement('select');
  map.id = `map${pos}`;
  [1, 2, 3, 4].forEach((m) => map.add(new Option(m, m)));
  map.value = pos + 1;
  map.onchange = () => send(`set_map:${pos}:${map.value}`);
  row.insertCell().appendChild(map);
  const inv = document.createElement('input');
  inv.type = 'checkbox';
  inv.id = `inv${pos}`;
  inv.onchange = () => send(`set_inv:${pos}:${inv.checked}`);
  row.insertCell().appendChild(inv);
  const test = row.insertCell();
  [['fwd', '&#8593;'], ['stop', '&#9632;'], ['bwd', '&#8595;']].forEach(([action, label]) => {
    const b = document.createElement('button');
    b.innerHTML = label;
    b.onclick = () => send(`test_${pos}_${action}`);
    test.appendChild(b);
  });
});

ws.onmessage = (e) => {
  $('config').textContent = e.data;
  try {
    const config = JSON.parse(e.data);
    for (let i = 0; i < 4; i++) {
      $(`map${i}`).value = config.mapping[i];
      $(`inv${i}`).checked = config.invert[i];
    }
  } catch (_) {}
};
ws.onopen = () => send('get_config');
setInterval(() => send('ping'), 300);

document.querySelectorAll('[data-cmd]').forEach((b) => b.onclick = () => send(b.dataset.cmd));
document.querySelectorAll('[data-hold]').forEach((b) => {
  b.onpointerdown = () => send(b.dataset.hold);
  b.onpointerup = b.onpointerleave = () => send('stop');
});
$('speed').onchange = (e) => send(`speed:${e.target.value}`);

const show = (joystick) => {
  $('joystick').classList.toggle('hidden', !joystick);
  $('buttons').classList.toggle('hidden', joystick);
  send('stop');
};
$('showButtons').onclick = () => show(false);
$('showJoystick').onclick = () => show(true);

const pad = $('pad');
const knob = $('knob');
let active = false;
let lastSent = 0;
const moveKnob = (dx, dy) => {
  knob.style.left = `${90 + dx}px`;
  knob.style.top = `${90 + dy}px`;
};
const track = (e) => {
  if (!active) return;
  const r = pad.getBoundingClientRect();
  let dx = e.clientX - r.left - r.width / 2;
  let dy = e.clientY - r.top - r.height / 2;
  const max = r.width / 2 - 30;
  const dist = Math.hypot(dx, dy);
  if (dist > max) { dx = dx * max / dist; dy = dy * max / dist; }
  moveKnob(dx, dy);
  const now = Date.now();
  if (now - lastSent < 50) return;
  lastSent = now;
  const x = Math.round(dx / max * 255);
  const y = -Math.round(dy / max * 255);
  send(`joy:${x}:${y}`);
};
pad.onpointerdown = (e) => { active = true; pad.setPointerCapture(e.pointerId); track(e); };
pad.onpointermove = track;
pad.onpointerup = pad.onpointercancel = () => {
  active = false;
  moveKnob(0, 0);
  send('stop');
};
</script>
</body>
</html>
"#;
