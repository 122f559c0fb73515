mod boilerplate_tests;
