//! Small helpers the host uses for error reporting and path comparison.

use colored::Colorize;

/// Maps a file name to the form used for comparisons.
pub type GetCanonicalFileName = fn(&str) -> String;

/// Log the exit code in red and terminate the process.
pub fn exit(exit_code: i32) -> ! {
    println!("{}", exit_message(exit_code).red());
    std::process::exit(exit_code)
}

fn exit_message(exit_code: i32) -> String {
    format!("Process exiting with code '{exit_code}'.")
}

/// Identity on case-sensitive file systems, lower-casing otherwise.
pub fn create_get_canonical_file_name(
    use_case_sensitive_file_names: bool,
) -> GetCanonicalFileName {
    if use_case_sensitive_file_names {
        |name| name.to_string()
    } else {
        |name| name.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_message() {
        assert_eq!(exit_message(2), "Process exiting with code '2'.");
    }

    #[test]
    fn test_canonical_file_name_case_sensitive() {
        let canonical = create_get_canonical_file_name(true);
        assert_eq!(canonical("/Proj/Src/App.ts"), "/Proj/Src/App.ts");
    }

    #[test]
    fn test_canonical_file_name_case_insensitive() {
        let canonical = create_get_canonical_file_name(false);
        assert_eq!(canonical("/Proj/Src/App.ts"), "/proj/src/app.ts");
        assert_eq!(canonical("C:\\Users\\ME"), "c:\\users\\me");
    }
}
