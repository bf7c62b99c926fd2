use nadraw::{
    Diagnostic, Diagram, DiagramMetadata, DiagramSnapshot, DragTarget, EdgeAngle, Point,
    PointerOutcome,
};
use serde::Serialize;
use std::io::Read;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Nad(nadraw::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Nad(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<nadraw::Error> for CliError {
    fn from(value: nadraw::Error) -> Self {
        Self::Nad(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Route,
    Drag,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    target: Option<DragTarget>,
    to: Option<Point>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteOut<'a> {
    #[serde(flatten)]
    snapshot: &'a DiagramSnapshot,
    angles: &'a [EdgeAngle],
    diagnostics: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DragOut<'a> {
    event: Option<&'a PointerOutcome>,
    edges: &'a [String],
    buses: &'a [String],
    text_nodes: &'a [String],
    geometry: &'a DiagramSnapshot,
    metadata: &'a DiagramMetadata,
    diagnostics: Vec<String>,
}

fn usage() -> &'static str {
    "nadraw\n\
\n\
USAGE:\n\
  nadraw [route] [--pretty] [<path>|-]\n\
  nadraw drag (--node <id>|--text-node <id>) --to <x>,<y> [--pretty] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', metadata JSON is read from stdin.\n\
  - route prints every edge, bus ring and label geometry plus the edge angle table.\n\
  - drag replays a press/move/release on the target and prints the move event, the redrawn\n\
    ids, the new geometry and the updated metadata.\n\
"
}

fn parse_point(text: &str) -> Option<Point> {
    let (x, y) = text.split_once(',')?;
    let x = x.trim().parse::<f64>().ok()?;
    let y = y.trim().parse::<f64>().ok()?;
    (x.is_finite() && y.is_finite()).then(|| nadraw::geom::point(x, y))
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "route" => args.command = Command::Route,
            "drag" => args.command = Command::Drag,
            "--pretty" => args.pretty = true,
            "--node" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.target = Some(DragTarget::Node(id.clone()));
            }
            "--text-node" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.target = Some(DragTarget::TextNode(id.clone()));
            }
            "--to" => {
                let Some(to) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.to = Some(parse_point(to).ok_or(CliError::Usage(usage()))?);
            }
            other if other.starts_with('-') && other != "-" => {
                return Err(CliError::Usage(usage()));
            }
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if matches!(args.command, Command::Drag) && (args.target.is_none() || args.to.is_none()) {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    println!();
    Ok(())
}

fn diagnostic_lines(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(|d| d.to_string()).collect()
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let mut diagram = Diagram::from_json_str(&text)?;
    for d in diagram.diagnostics() {
        eprintln!("warning: {d}");
    }

    match args.command {
        Command::Route => {
            let snapshot = diagram.snapshot();
            let angles = diagram.edge_angles();
            write_json(
                &RouteOut {
                    snapshot: &snapshot,
                    angles: &angles,
                    diagnostics: diagnostic_lines(diagram.diagnostics()),
                },
                args.pretty,
            )
        }
        Command::Drag => {
            let (Some(target), Some(to)) = (args.target, args.to) else {
                return Err(CliError::Usage(usage()));
            };
            let grab_at = match &target {
                DragTarget::Node(id) => diagram.node_position(id)?,
                DragTarget::TextNode(id) => diagram
                    .text_node_geometry(id)?
                    .map(|g| g.position)
                    .unwrap_or(to),
            };
            diagram.pointer_down(target, grab_at)?;
            let report = diagram.pointer_move(to)?.unwrap_or_default();
            let event = diagram.pointer_up();
            let geometry = diagram.snapshot();
            write_json(
                &DragOut {
                    event: event.as_ref(),
                    edges: &report.edges,
                    buses: &report.buses,
                    text_nodes: &report.text_nodes,
                    geometry: &geometry,
                    metadata: diagram.metadata(),
                    diagnostics: diagnostic_lines(diagram.diagnostics()),
                },
                args.pretty,
            )
        }
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
