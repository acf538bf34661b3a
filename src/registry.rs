/// A system action exposed to the matching layer.
///
/// `imports` is the import block the generated script needs before it can
/// invoke the action; `description` is what gets embedded and searched.
#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub imports: &'static str,
}

/// Static table of callable system actions. Built once at startup.
#[derive(Debug)]
pub struct FunctionRegistry {
    entries: Vec<FunctionSpec>,
}

impl FunctionRegistry {
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                FunctionSpec {
                    name: "open_chrome",
                    description: "Opens Google Chrome browser",
                    imports: "import webbrowser",
                },
                FunctionSpec {
                    name: "open_calculator",
                    description: "Opens system calculator",
                    imports: "import os",
                },
                FunctionSpec {
                    name: "retrieve_cpu_usage",
                    description: "Fetches current CPU usage percentage",
                    imports: "import psutil",
                },
                FunctionSpec {
                    name: "retrieve_ram_usage",
                    description: "Fetches current RAM usage percentage",
                    imports: "import psutil",
                },
                FunctionSpec {
                    name: "execute_shell_command",
                    description: "Executes a given shell command",
                    imports: "import subprocess",
                },
            ],
        }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSpec> {
        self.entries.iter().find(|spec| spec.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|spec| spec.name).collect()
    }

    /// Iteration order is stable; the vector index uses the position as the
    /// point id.
    pub fn iter(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
