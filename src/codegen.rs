use serde_json::Value;

use crate::error::{DispatchError, Result};
use crate::registry::FunctionRegistry;

/// Creates clean, ready-to-run Python code for any registered function.
/// The script carries the imports the function needs, an error-handled
/// main(), and the standard script entry point.
pub struct CodeGenerator;

impl CodeGenerator {
    pub fn generate_execution_code(
        registry: &FunctionRegistry,
        function_name: &str,
        args: &[Value],
    ) -> Result<String> {
        let spec = registry
            .get(function_name)
            .ok_or_else(|| DispatchError::UnknownFunction(function_name.to_string()))?;

        let rendered_args = args
            .iter()
            .map(py_literal)
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            r#"{imports}

def main():
    try:
        result = {name}({args})
        print(f"Success! Result: {{result}}")
        return result
    except Exception as e:
        print(f"Error: {{e}}")
        return None

if __name__ == "__main__":
    main()
"#,
            imports = spec.imports,
            name = function_name,
            args = rendered_args,
        ))
    }
}

/// Render a JSON value as a Python literal.
fn py_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => py_string(s),
        Value::Array(items) => {
            let inner = items.iter().map(py_literal).collect::<Vec<_>>().join(", ");
            format!("[{inner}]")
        }
        Value::Object(map) => {
            let inner = map
                .iter()
                .map(|(k, v)| format!("{}: {}", py_string(k), py_literal(v)))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{{{inner}}}")
        }
    }
}

fn py_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generates_script_without_args() {
        let registry = FunctionRegistry::builtin();
        let code =
            CodeGenerator::generate_execution_code(&registry, "open_calculator", &[]).unwrap();
        assert!(code.starts_with("import os\n"));
        assert!(code.contains("result = open_calculator()"));
        assert!(code.contains("if __name__ == \"__main__\":"));
    }

    #[test]
    fn test_generates_script_with_string_arg() {
        let registry = FunctionRegistry::builtin();
        let args = vec![json!("ls -la")];
        let code =
            CodeGenerator::generate_execution_code(&registry, "execute_shell_command", &args)
                .unwrap();
        assert!(code.contains("result = execute_shell_command('ls -la')"));
        assert!(code.contains("import subprocess"));
    }

    #[test]
    fn test_unknown_function_is_error() {
        let registry = FunctionRegistry::builtin();
        let err =
            CodeGenerator::generate_execution_code(&registry, "format_disk", &[]).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownFunction(name) if name == "format_disk"));
    }

    #[test]
    fn test_py_literal_escaping() {
        assert_eq!(py_literal(&json!("it's")), "'it\\'s'");
        assert_eq!(py_literal(&json!(true)), "True");
        assert_eq!(py_literal(&json!(null)), "None");
        assert_eq!(py_literal(&json!(3.5)), "3.5");
        assert_eq!(py_literal(&json!([1, "a"])), "[1, 'a']");
        assert_eq!(py_literal(&json!({"k": 1})), "{'k': 1}");
    }
}
